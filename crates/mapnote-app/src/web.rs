//! WebAssembly entry point and platform-specific code.

use wasm_bindgen::prelude::*;

/// The page's query string and hash fragment, in that order.
///
/// Both may carry map parameters, e.g. `?lon=2.35&lat=48.85#zoom=12`.
pub fn url_queries() -> Vec<String> {
    let Some(window) = web_sys::window() else {
        return Vec::new();
    };
    let location = window.location();
    [location.search(), location.hash()]
        .into_iter()
        .filter_map(Result::ok)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Initialize and run the WASM application.
#[wasm_bindgen(start)]
pub async fn run_wasm() {
    console_error_panic_hook::set_once();

    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("Failed to initialize logger: {}", e).into());
    }

    log::info!("Starting MapNote (WASM)");

    crate::App::run().await;
}
