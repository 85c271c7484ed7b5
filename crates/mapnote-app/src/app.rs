//! Core application state and lifecycle.

use kurbo::Size;
use mapnote_core::storage::{
    MemoryStorage, PlatformStorage, Storage, StorageResult, create_default_storage,
};
use mapnote_core::{MapConfig, MapEvent, MapSession, PointerEvent};
use mapnote_render::{RenderContext, Renderer, RendererError, TileCache, VelloRenderer};
use peniko::Color;
use std::sync::Arc;
use vello::util::RenderSurface;
use vello::wgpu::PresentMode;
use vello::{AaConfig, RenderParams, RendererOptions, Scene};
use winit::application::ApplicationHandler;
#[cfg(not(target_arch = "wasm32"))]
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::ModifiersState;
use winit::window::{Window, WindowId};

use crate::event_handler::EventHandler;
use crate::shortcuts::command_for_key;
use crate::tile_fetch::TileFetcher;
use crate::ui::{MapOverlay, UiAction, UiState, render_ui};

/// Padding around features when zooming to them, in logical pixels.
const FIT_PADDING: f64 = 48.0;

/// File name offered when exporting.
const EXPORT_FILE_NAME: &str = "features.geojson";

#[cfg(feature = "native")]
mod file_ops {
    use super::EXPORT_FILE_NAME;

    /// Save the GeoJSON payload through a native save dialog.
    pub fn export_geojson(json: &str) {
        let dialog = rfd::FileDialog::new()
            .set_title("Export GeoJSON")
            .set_file_name(EXPORT_FILE_NAME)
            .add_filter("GeoJSON", &["geojson", "json"]);

        if let Some(path) = dialog.save_file() {
            match std::fs::write(&path, json) {
                Ok(()) => log::info!("Exported features to {:?}", path),
                Err(e) => log::error!("Failed to write {:?}: {}", path, e),
            }
        }
    }

    /// Pick a GeoJSON file and return its text.
    pub fn pick_geojson() -> Option<String> {
        let path = rfd::FileDialog::new()
            .set_title("Import GeoJSON")
            .add_filter("GeoJSON", &["geojson", "json"])
            .pick_file()?;

        match std::fs::read_to_string(&path) {
            Ok(text) => {
                log::info!("Read {:?}", path);
                Some(text)
            }
            Err(e) => {
                log::error!("Failed to read {:?}: {}", path, e);
                None
            }
        }
    }
}

#[cfg(all(not(feature = "native"), not(target_arch = "wasm32")))]
mod file_ops {
    pub fn export_geojson(_json: &str) {
        log::warn!("File dialogs need the `native` feature");
    }

    pub fn pick_geojson() -> Option<String> {
        log::warn!("File dialogs need the `native` feature");
        None
    }
}

#[cfg(target_arch = "wasm32")]
mod file_ops {
    use super::EXPORT_FILE_NAME;
    use std::cell::RefCell;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    thread_local! {
        static PENDING_IMPORT: RefCell<Option<String>> = const { RefCell::new(None) };
    }

    /// Offer the payload as a browser download.
    pub fn export_geojson(json: &str) {
        if let Err(e) = download_file(EXPORT_FILE_NAME, json, "application/geo+json") {
            log::error!("Failed to download features: {:?}", e);
        }
    }

    fn download_file(filename: &str, content: &str, mime_type: &str) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let blob_parts = js_sys::Array::new();
        blob_parts.push(&JsValue::from_str(content));
        let options = web_sys::BlobPropertyBag::new();
        options.set_type(mime_type);
        let blob = web_sys::Blob::new_with_str_sequence_and_options(&blob_parts, &options)?;

        let url = web_sys::Url::create_object_url_with_blob(&blob)?;
        let a = document
            .create_element("a")?
            .dyn_into::<web_sys::HtmlAnchorElement>()?;
        a.set_href(&url);
        a.set_download(filename);
        a.click();

        web_sys::Url::revoke_object_url(&url)
    }

    /// Open a file picker; the chosen file's text shows up in
    /// `take_pending_import()` once read.
    pub fn pick_geojson_async() {
        if let Err(e) = trigger_file_input() {
            log::error!("Failed to open file picker: {:?}", e);
        }
    }

    pub fn take_pending_import() -> Option<String> {
        PENDING_IMPORT.with(|cell| cell.borrow_mut().take())
    }

    fn trigger_file_input() -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let input = document
            .create_element("input")?
            .dyn_into::<web_sys::HtmlInputElement>()?;
        input.set_type("file");
        input.set_accept(".geojson,.json");
        input.style().set_property("display", "none")?;

        let input_clone = input.clone();
        let onchange = Closure::once(Box::new(move |_event: web_sys::Event| {
            if let Some(file) = input_clone.files().and_then(|files| files.get(0)) {
                if let Err(e) = read_file(&file) {
                    log::error!("Failed to read {}: {:?}", file.name(), e);
                }
            }
            input_clone.remove();
        }) as Box<dyn FnOnce(_)>);
        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();

        document
            .body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&input)?;
        input.click();
        Ok(())
    }

    fn read_file(file: &web_sys::File) -> Result<(), JsValue> {
        let reader = web_sys::FileReader::new()?;
        let reader_clone = reader.clone();
        let onload = Closure::once(Box::new(move |_event: web_sys::Event| {
            match reader_clone.result().ok().and_then(|r| r.as_string()) {
                Some(text) => PENDING_IMPORT.with(|cell| *cell.borrow_mut() = Some(text)),
                None => log::error!("File did not contain text"),
            }
        }) as Box<dyn FnOnce(_)>);
        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        onload.forget();
        reader.read_as_text(file)
    }
}

/// Surface created asynchronously on the web, picked up by the event loop.
#[cfg(target_arch = "wasm32")]
type SurfaceResult = Result<(vello::util::RenderContext, RenderSurface<'static>), String>;

#[cfg(target_arch = "wasm32")]
thread_local! {
    static PENDING_SURFACE: std::cell::RefCell<Option<SurfaceResult>> =
        const { std::cell::RefCell::new(None) };
}

/// Storage behind the session: the platform slot, or memory when the
/// platform slot cannot be opened.
pub enum SessionStorage {
    Platform(PlatformStorage),
    Memory(MemoryStorage),
}

impl SessionStorage {
    fn open() -> Self {
        match create_default_storage() {
            Ok(storage) => Self::Platform(storage),
            Err(e) => {
                log::warn!("Persistent storage unavailable, keeping features in memory: {}", e);
                Self::Memory(MemoryStorage::new())
            }
        }
    }
}

impl Storage for SessionStorage {
    fn get(&self, key: &str) -> StorageResult<String> {
        match self {
            Self::Platform(s) => s.get(key),
            Self::Memory(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        match self {
            Self::Platform(s) => s.set(key, value),
            Self::Memory(s) => s.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match self {
            Self::Platform(s) => s.remove(key),
            Self::Memory(s) => s.remove(key),
        }
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        match self {
            Self::Platform(s) => s.exists(key),
            Self::Memory(s) => s.exists(key),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Shown behind tiles that are not loaded yet.
    pub background_color: Color,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "MapNote".to_string(),
            width: 1280,
            height: 800,
            background_color: Color::from_rgba8(242, 239, 233, 255),
        }
    }
}

/// Runtime state for the application.
struct AppState {
    // Windowing
    window: Arc<Window>,
    surface: RenderSurface<'static>,

    // Rendering
    vello_renderer: vello::Renderer,
    map_renderer: VelloRenderer,
    /// Texture blitter for RGBA->surface format conversion (needed for WebGPU/WASM)
    texture_blitter: vello::wgpu::util::TextureBlitter,

    // egui
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    ui_state: UiState,

    // Map
    session: MapSession<SessionStorage>,
    tiles: TileCache,
    fetcher: TileFetcher,

    event_handler: EventHandler,
    modifiers: ModifiersState,
    config: AppConfig,
}

impl AppState {
    fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    /// Keep the map viewport (logical pixels) in step with the surface.
    fn resize_viewport(&mut self, width: u32, height: u32) {
        let scale = self.scale_factor();
        self.session
            .set_viewport_size(Size::new(width as f64 / scale, height as f64 / scale));
    }

    fn pointer(&mut self, event: PointerEvent) {
        if let Some(map_event) = self.session.handle_pointer(event) {
            self.report(map_event);
        }
    }

    fn report(&mut self, event: MapEvent) {
        let message = match event {
            MapEvent::DrawEnd(_) => "Feature added",
            MapEvent::ModifyEnd(_) => "Feature updated",
            MapEvent::Deleted(_) => "Feature deleted",
        };
        log::debug!("{:?}", event);
        self.ui_state.status = Some(message.to_string());
    }

    fn apply_action(&mut self, action: UiAction) {
        match action {
            UiAction::SetGeometryKind(kind) => self.session.set_geometry_kind(kind),
            UiAction::DeleteFeature(id) => {
                if let Some(event) = self.session.delete_feature(id) {
                    self.report(event);
                }
            }
            UiAction::FinishDrawing => {
                if let Some(event) = self.session.finish_drawing() {
                    self.report(event);
                }
            }
            UiAction::UndoVertex => {
                self.session.undo_vertex();
            }
            UiAction::AbortDrawing => self.session.abort_drawing(),
            UiAction::FitToFeatures => {
                self.session.fit_to_features(FIT_PADDING);
            }
            UiAction::ExportGeoJson => match self.session.export_geojson() {
                Ok(json) => file_ops::export_geojson(&json),
                Err(e) => log::error!("Failed to encode features: {}", e),
            },
            UiAction::ImportGeoJson => {
                #[cfg(not(target_arch = "wasm32"))]
                if let Some(text) = file_ops::pick_geojson() {
                    self.import_text(&text);
                }
                #[cfg(target_arch = "wasm32")]
                file_ops::pick_geojson_async();
            }
            UiAction::ClearAll => {
                self.session.clear();
                self.ui_state.status = Some("Cleared all features".to_string());
            }
        }
    }

    fn import_text(&mut self, text: &str) {
        let status = match self.session.import_geojson(text) {
            Ok(count) => format!("Imported {} features", count),
            Err(e) => {
                log::error!("Failed to import GeoJSON: {}", e);
                "Import failed".to_string()
            }
        };
        self.ui_state.status = Some(status);
    }

    /// Store finished downloads and start fetching visible tiles that are
    /// still missing.
    fn update_tiles(&mut self) {
        for response in self.fetcher.drain() {
            let stored = match response.bytes {
                Ok(bytes) => self
                    .tiles
                    .insert_bytes(response.id, &bytes)
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e),
            };
            if let Err(e) = stored {
                log::warn!("Tile {} unavailable: {}", response.id, e);
                self.tiles.mark_failed(response.id);
            }
        }

        let visible = self.session.view().visible_tiles();
        self.tiles.request(&visible);
        let wanted = self.tiles.pending(&visible);
        self.fetcher.request(self.session.tile_source(), &wanted);
    }

    fn overlay(&self) -> MapOverlay {
        let view = self.session.view();
        MapOverlay {
            kind: self.session.geometry_kind(),
            controls: self
                .session
                .controls()
                .in_order(self.session.collection().ids())
                .map(|control| {
                    let p = control.screen_position(view);
                    (control.feature, egui::Pos2::new(p.x as f32, p.y as f32))
                })
                .collect(),
            feature_count: self.session.collection().len(),
            drawing: self.session.is_drawing(),
            attribution: self.session.tile_source().attribution.clone(),
        }
    }

    fn build_scene(&mut self) -> Scene {
        let ctx = RenderContext::new(
            self.session.collection(),
            self.session.view(),
            self.session.style(),
        )
        .with_tiles(&self.tiles)
        .with_sketch(self.session.sketch())
        .with_hovered_vertex(self.session.hovered_vertex())
        .with_vertices(true)
        .with_scale_factor(self.window.scale_factor())
        .with_background(self.config.background_color);

        self.map_renderer.build_scene(&ctx);
        self.map_renderer.take_scene()
    }
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    map_config: MapConfig,
    state: Option<AppState>,
    render_cx: Option<vello::util::RenderContext>,
    /// Window waiting for async surface creation (WASM only)
    pending_window: Option<Arc<Window>>,
    #[cfg(target_arch = "wasm32")]
    init_in_progress: bool,
}

impl App {
    /// Create a new application with default window settings and the
    /// platform's map configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), crate::config::load_map_config())
    }

    /// Create a new application with custom configuration.
    pub fn with_config(config: AppConfig, map_config: MapConfig) -> Self {
        Self {
            config,
            map_config,
            state: None,
            render_cx: None,
            pending_window: None,
            #[cfg(target_arch = "wasm32")]
            init_in_progress: false,
        }
    }

    /// Run the application.
    pub async fn run() {
        let event_loop = match EventLoop::new() {
            Ok(event_loop) => event_loop,
            Err(e) => {
                log::error!("Failed to create event loop: {}", e);
                return;
            }
        };
        let app = App::new();

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::EventLoopExtWebSys;
            event_loop.spawn_app(app);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut app = app;
            if let Err(e) = event_loop.run_app(&mut app) {
                log::error!("Event loop error: {}", e);
            }
        }
    }

    /// Finish initialization after surface is created.
    fn finish_init(
        &mut self,
        window: Arc<Window>,
        surface: RenderSurface<'static>,
    ) -> Result<(), RendererError> {
        let render_cx = self
            .render_cx
            .as_ref()
            .ok_or_else(|| RendererError::InitFailed("render context missing".to_string()))?;
        let device = &render_cx.devices[surface.dev_id].device;

        let vello_renderer = vello::Renderer::new(device, RendererOptions::default())
            .map_err(|e| RendererError::InitFailed(e.to_string()))?;

        // Vello renders to Rgba8Unorm; the surface is often Bgra8Unorm on WebGPU
        let texture_blitter =
            vello::wgpu::util::TextureBlitter::new(device, surface.config.format);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface.config.format,
            egui_wgpu::RendererOptions::default(),
        );

        let storage = Arc::new(SessionStorage::open());
        let session = MapSession::open(self.map_config.clone(), storage);
        let tiles = TileCache::new(self.map_config.tile_cache_capacity);

        log::info!(
            "MapNote initialized - {}x{}, {} features",
            surface.config.width,
            surface.config.height,
            session.collection().len()
        );
        log::info!("Keys: 1=Point, 2=LineString, 3=Polygon, Enter=Finish, Escape=Abort");

        let (width, height) = (surface.config.width, surface.config.height);
        let mut state = AppState {
            window: window.clone(),
            surface,
            vello_renderer,
            map_renderer: VelloRenderer::new(),
            texture_blitter,
            egui_ctx,
            egui_state,
            egui_renderer,
            ui_state: UiState::default(),
            session,
            tiles,
            fetcher: TileFetcher::new(),
            event_handler: EventHandler::new(),
            modifiers: ModifiersState::empty(),
            config: self.config.clone(),
        };
        state.resize_viewport(width, height);
        self.state = Some(state);
        self.pending_window = None;

        window.request_redraw();
        Ok(())
    }

    /// Pick up an asynchronously created surface (WASM only).
    #[cfg(target_arch = "wasm32")]
    fn poll_pending_surface(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.pending_window.clone() else {
            return;
        };

        if !self.init_in_progress {
            self.init_in_progress = true;
            let (width, height) = web_viewport_size(self.config.width, self.config.height);
            let window_clone = window.clone();

            wasm_bindgen_futures::spawn_local(async move {
                log::info!("Creating surface asynchronously...");
                let mut render_cx = vello::util::RenderContext::new();
                let result = render_cx
                    .create_surface(window_clone, width, height, PresentMode::AutoVsync)
                    .await
                    .map(|surface| (render_cx, surface))
                    .map_err(|e| format!("{:?}", e));
                PENDING_SURFACE.with(|cell| *cell.borrow_mut() = Some(result));
            });
        }

        match PENDING_SURFACE.with(|cell| cell.borrow_mut().take()) {
            Some(Ok((render_cx, surface))) => {
                log::info!("Surface created successfully");
                self.render_cx = Some(render_cx);
                if let Err(e) = self.finish_init(window.clone(), surface) {
                    log::error!("{}", e);
                    event_loop.exit();
                }
            }
            Some(Err(e)) => {
                log::error!("Failed to create surface: {}", e);
                self.init_in_progress = false;
            }
            None => {}
        }

        // Keep the event loop turning until the surface arrives
        window.request_redraw();
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Physical size of the browser viewport.
#[cfg(target_arch = "wasm32")]
fn web_viewport_size(fallback_width: u32, fallback_height: u32) -> (u32, u32) {
    let Some(web_window) = web_sys::window() else {
        return (fallback_width, fallback_height);
    };
    let dpr = web_window.device_pixel_ratio();
    let width = web_window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(fallback_width as f64);
    let height = web_window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(fallback_height as f64);
    ((width * dpr) as u32, (height * dpr) as u32)
}

/// Find or create the full-page canvas the map draws into.
#[cfg(target_arch = "wasm32")]
fn web_canvas(width: u32, height: u32) -> Option<web_sys::HtmlCanvasElement> {
    use wasm_bindgen::JsCast;

    let document = web_sys::window()?.document()?;
    if let Some(loading) = document.get_element_by_id("loading") {
        loading.remove();
    }

    let canvas = document
        .get_element_by_id("mapnote-canvas")
        .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        .or_else(|| {
            let parent = document
                .get_element_by_id("app")
                .or_else(|| document.body().map(Into::into))?;
            let canvas = document.create_element("canvas").ok()?;
            canvas.set_id("mapnote-canvas");
            parent.append_child(&canvas).ok()?;
            canvas.dyn_into::<web_sys::HtmlCanvasElement>().ok()
        })?;

    canvas.set_width(width);
    canvas.set_height(height);
    let style = canvas.style();
    for (name, value) in [
        ("width", "100%"),
        ("height", "100%"),
        ("display", "block"),
        ("position", "fixed"),
        ("top", "0"),
        ("left", "0"),
    ] {
        let _ = style.set_property(name, value);
    }
    Some(canvas)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.pending_window.is_some() {
            return;
        }

        log::info!("Creating window...");

        #[cfg(not(target_arch = "wasm32"))]
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        #[cfg(target_arch = "wasm32")]
        let window_attrs = {
            use winit::platform::web::WindowAttributesExtWebSys;

            let (width, height) = web_viewport_size(self.config.width, self.config.height);
            let Some(canvas) = web_canvas(width, height) else {
                log::error!("Failed to create canvas");
                event_loop.exit();
                return;
            };
            Window::default_attributes()
                .with_title(&self.config.title)
                .with_canvas(Some(canvas))
        };

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        // On native, block on surface creation
        #[cfg(not(target_arch = "wasm32"))]
        {
            let size = window.inner_size();
            let (width, height) = if size.width == 0 || size.height == 0 {
                (self.config.width, self.config.height)
            } else {
                (size.width, size.height)
            };
            log::info!("Surface size: {}x{}", width, height);

            let render_cx = self
                .render_cx
                .get_or_insert_with(vello::util::RenderContext::new);
            let surface = match pollster::block_on(render_cx.create_surface(
                window.clone(),
                width,
                height,
                PresentMode::AutoVsync,
            )) {
                Ok(surface) => surface,
                Err(e) => {
                    log::error!("Failed to create surface: {:?}", e);
                    event_loop.exit();
                    return;
                }
            };

            if let Err(e) = self.finish_init(window, surface) {
                log::error!("{}", e);
                event_loop.exit();
            }
        }

        // On WASM, the surface is created on the first window event
        #[cfg(target_arch = "wasm32")]
        {
            self.pending_window = Some(window);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        #[cfg(target_arch = "wasm32")]
        if self.state.is_none() {
            self.poll_pending_surface(event_loop);
            return;
        }

        let Some(state) = &mut self.state else {
            return;
        };

        // Let egui process the event first
        let egui_response = state.egui_state.on_window_event(&state.window, &event);
        let egui_wants_input = egui_response.consumed
            || state.egui_ctx.is_pointer_over_area()
            || state.egui_ctx.wants_pointer_input()
            || state.egui_ctx.wants_keyboard_input();

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(render_cx) = self.render_cx.as_ref() {
                    render_cx.resize_surface(&mut state.surface, size.width, size.height);
                }
                state.resize_viewport(size.width, size.height);
                state.window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = state.window.inner_size();
                state.resize_viewport(size.width, size.height);
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                state.modifiers = modifiers.state();
            }

            WindowEvent::CursorMoved { position, .. } => {
                let scale = state.scale_factor();
                let event = state.event_handler.cursor_moved(position, scale);
                // A drag that started on the map keeps going over egui panels
                if egui_wants_input && !state.event_handler.is_map_pressed() {
                    return;
                }
                state.pointer(event);
            }

            WindowEvent::Focused(false) => {
                state.event_handler.release_all();
                state.session.clear_hover();
            }

            WindowEvent::CursorLeft { .. } => {
                if !state.event_handler.is_map_pressed() {
                    state.session.clear_hover();
                }
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                match button_state {
                    ElementState::Pressed if egui_wants_input => return,
                    ElementState::Released
                        if egui_wants_input && !state.event_handler.is_map_pressed() =>
                    {
                        return;
                    }
                    _ => {}
                }
                let was_panning = state.session.is_panning();
                for event in state.event_handler.mouse_input(button_state, button, was_panning) {
                    state.pointer(event);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                if egui_wants_input {
                    return;
                }
                let event = state.event_handler.mouse_wheel(delta);
                state.pointer(event);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if egui_wants_input || event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let ctrl = state.modifiers.control_key() || state.modifiers.super_key();
                if let Some(action) = command_for_key(&event.logical_key, ctrl) {
                    state.apply_action(action);
                }
            }

            WindowEvent::RedrawRequested => {
                #[cfg(target_arch = "wasm32")]
                if let Some(text) = file_ops::take_pending_import() {
                    state.import_text(&text);
                }

                state.update_tiles();

                // Run egui and apply any action it produced
                let overlay = state.overlay();
                let egui_input = state.egui_state.take_egui_input(&state.window);
                let mut ui_action = None;
                let egui_output = state.egui_ctx.run(egui_input, |ctx| {
                    ui_action = render_ui(ctx, &mut state.ui_state, &overlay);
                });
                state
                    .egui_state
                    .handle_platform_output(&state.window, egui_output.platform_output);
                let egui_primitives = state
                    .egui_ctx
                    .tessellate(egui_output.shapes, egui_output.pixels_per_point);
                if let Some(action) = ui_action {
                    state.apply_action(action);
                }

                let scene = state.build_scene();

                let Some(render_cx) = self.render_cx.as_ref() else {
                    return;
                };
                let device_handle = &render_cx.devices[state.surface.dev_id];
                let device = &device_handle.device;
                let queue = &device_handle.queue;

                let surface_texture = match state.surface.surface.get_current_texture() {
                    Ok(t) => t,
                    Err(e) => {
                        log::warn!("Failed to get surface texture: {:?}", e);
                        return;
                    }
                };

                let width = state.surface.config.width;
                let height = state.surface.config.height;

                let params = RenderParams {
                    base_color: state.config.background_color,
                    width,
                    height,
                    antialiasing_method: AaConfig::Area,
                };

                // Vello's compute shaders need a StorageBinding Rgba8Unorm target;
                // it is copied to the surface afterwards
                let render_texture = device.create_texture(&vello::wgpu::TextureDescriptor {
                    label: Some("vello render texture"),
                    size: vello::wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: vello::wgpu::TextureDimension::D2,
                    format: vello::wgpu::TextureFormat::Rgba8Unorm,
                    usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                        | vello::wgpu::TextureUsages::COPY_SRC
                        | vello::wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                });
                let render_texture_view =
                    render_texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

                if let Err(e) = state.vello_renderer.render_to_texture(
                    device,
                    queue,
                    &scene,
                    &render_texture_view,
                    &params,
                ) {
                    log::error!("Failed to render: {:?}", e);
                    return;
                }

                let surface_view = surface_texture
                    .texture
                    .create_view(&vello::wgpu::TextureViewDescriptor::default());

                {
                    let mut blit_encoder =
                        device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                            label: Some("blit encoder"),
                        });
                    state.texture_blitter.copy(
                        device,
                        &mut blit_encoder,
                        &render_texture_view,
                        &surface_view,
                    );
                    queue.submit(std::iter::once(blit_encoder.finish()));
                }

                for (id, image_delta) in &egui_output.textures_delta.set {
                    state
                        .egui_renderer
                        .update_texture(device, queue, *id, image_delta);
                }

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [width, height],
                    pixels_per_point: egui_output.pixels_per_point,
                };

                {
                    let mut egui_encoder =
                        device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                            label: Some("egui encoder"),
                        });
                    state.egui_renderer.update_buffers(
                        device,
                        queue,
                        &mut egui_encoder,
                        &egui_primitives,
                        &screen_descriptor,
                    );

                    let render_pass =
                        egui_encoder.begin_render_pass(&vello::wgpu::RenderPassDescriptor {
                            label: Some("egui render pass"),
                            color_attachments: &[Some(vello::wgpu::RenderPassColorAttachment {
                                view: &surface_view,
                                resolve_target: None,
                                ops: vello::wgpu::Operations {
                                    load: vello::wgpu::LoadOp::Load,
                                    store: vello::wgpu::StoreOp::Store,
                                },
                                depth_slice: None,
                            })],
                            depth_stencil_attachment: None,
                            timestamp_writes: None,
                            occlusion_query_set: None,
                        });

                    // egui-wgpu wants a 'static render pass
                    let mut render_pass = render_pass.forget_lifetime();
                    state
                        .egui_renderer
                        .render(&mut render_pass, &egui_primitives, &screen_descriptor);
                    drop(render_pass);

                    queue.submit(std::iter::once(egui_encoder.finish()));
                }

                for id in &egui_output.textures_delta.free {
                    state.egui_renderer.free_texture(id);
                }
                surface_texture.present();
                state.window.request_redraw();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}
