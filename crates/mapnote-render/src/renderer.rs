//! The renderer seam and the per-frame inputs it draws from.

use crate::tiles::TileCache;
use kurbo::Size;
use mapnote_core::feature::FeatureId;
use mapnote_core::geometry::VertexRef;
use mapnote_core::interaction::Sketch;
use mapnote_core::style::FeatureStyle;
use mapnote_core::{FeatureCollection, MapView};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Tile decode failed: {0}")]
    Decode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
///
/// Geometry is placed through `view` in logical pixels; `scale_factor`
/// maps those to physical pixels.
pub struct RenderContext<'a> {
    pub collection: &'a FeatureCollection,
    pub view: &'a MapView,
    pub style: &'a FeatureStyle,
    /// Basemap tiles. Without a cache only placeholders are drawn.
    pub tiles: Option<&'a TileCache>,
    /// In-progress drawing.
    pub sketch: Option<Sketch>,
    /// Vertex to highlight (hovered or dragged).
    pub hovered_vertex: Option<(FeatureId, VertexRef)>,
    /// Draw a handle on every vertex of every feature.
    pub show_vertices: bool,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Shown behind tiles that are not loaded yet.
    pub background_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(collection: &'a FeatureCollection, view: &'a MapView, style: &'a FeatureStyle) -> Self {
        Self {
            collection,
            view,
            style,
            tiles: None,
            sketch: None,
            hovered_vertex: None,
            show_vertices: false,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(242, 239, 233, 255),
        }
    }

    /// Viewport size in physical pixels.
    pub fn physical_size(&self) -> Size {
        self.view.viewport_size() * self.scale_factor
    }

    pub fn with_tiles(mut self, tiles: &'a TileCache) -> Self {
        self.tiles = Some(tiles);
        self
    }

    pub fn with_sketch(mut self, sketch: Option<Sketch>) -> Self {
        self.sketch = sketch;
        self
    }

    pub fn with_hovered_vertex(mut self, vertex: Option<(FeatureId, VertexRef)>) -> Self {
        self.hovered_vertex = vertex;
        self
    }

    pub fn with_vertices(mut self, show: bool) -> Self {
        self.show_vertices = show;
        self
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }
}

/// Builds a frame of the map: basemap tiles, then the feature overlay.
pub trait Renderer: Send + Sync {
    /// Build the scene for a frame: basemap, features, sketch, highlights.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_context_builders() {
        let collection = FeatureCollection::new();
        let mut view = MapView::new(Point::ZERO, 3.0);
        view.set_viewport_size(Size::new(400.0, 300.0));
        let style = FeatureStyle::default();
        let cache = TileCache::new(8);

        let ctx = RenderContext::new(&collection, &view, &style)
            .with_tiles(&cache)
            .with_scale_factor(2.0)
            .with_vertices(true);
        assert!(ctx.tiles.is_some());
        assert!(ctx.show_vertices);
        assert_eq!(ctx.physical_size(), Size::new(800.0, 600.0));
    }
}
