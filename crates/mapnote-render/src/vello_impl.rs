//! Vello-based renderer implementation.

use crate::renderer::{RenderContext, Renderer};
use crate::tiles::TileEntry;
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape as KurboShape, Stroke};
use mapnote_core::geometry::Geometry;
use mapnote_core::interaction::Sketch;
use mapnote_core::style::FeatureStyle;
use mapnote_core::tiles::PlacedTile;
use mapnote_core::{GeometryKind, MapView};
use peniko::{Color, Fill};
use vello::Scene;

/// Radius of vertex handles in logical pixels.
const VERTEX_RADIUS: f64 = 4.0;

/// Vello-based renderer for GPU-accelerated 2D graphics.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
        }
    }

    /// Get the built scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (for rendering).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Basemap: decoded tiles, placeholders for the rest.
    fn render_tiles(&mut self, ctx: &RenderContext, transform: Affine) {
        let placeholder = Color::from_rgba8(224, 224, 224, 255);
        let grid = Color::from_rgba8(200, 200, 200, 255);

        for PlacedTile { id, rect } in ctx.view.visible_tiles() {
            let entry = ctx.tiles.and_then(|cache| cache.get(id));
            match entry {
                Some(TileEntry::Ready(image)) if image.width > 0 && image.height > 0 => {
                    let image_transform = transform
                        * Affine::translate((rect.x0, rect.y0))
                        * Affine::scale_non_uniform(
                            rect.width() / image.width as f64,
                            rect.height() / image.height as f64,
                        );
                    self.scene.draw_image(&peniko::ImageBrush::from(image.clone()), image_transform);
                }
                _ => {
                    let path = rect.to_path(0.1);
                    self.scene.fill(Fill::NonZero, transform, placeholder, None, &path);
                    self.scene.stroke(&Stroke::new(1.0), transform, grid, None, &path);
                }
            }
        }
    }

    /// Draw on the world copy nearest the view center.
    fn render_geometry(&mut self, geometry: &Geometry, view: &MapView, style: &FeatureStyle, transform: Affine) {
        let shift = view.geometry_shift(geometry);
        match geometry {
            Geometry::Point(p) => {
                let circle = Circle::new(view.shifted_to_screen(*p, shift), style.point_radius);
                self.scene.fill(
                    Fill::NonZero,
                    transform,
                    Color::from(style.point_fill),
                    None,
                    &circle,
                );
            }
            Geometry::LineString(points) => {
                let path = screen_path(points, view, shift, false);
                self.scene.stroke(
                    &Stroke::new(style.stroke_width),
                    transform,
                    Color::from(style.stroke),
                    None,
                    &path,
                );
            }
            Geometry::Polygon(rings) => {
                // Rings share one path so holes cut out of the fill
                let mut path = BezPath::new();
                for ring in rings {
                    path.extend(screen_path(ring, view, shift, true));
                }
                self.scene
                    .fill(Fill::EvenOdd, transform, Color::from(style.fill), None, &path);
                self.scene.stroke(
                    &Stroke::new(style.stroke_width),
                    transform,
                    Color::from(style.stroke),
                    None,
                    &path,
                );
            }
        }
    }

    /// In-progress drawing: dashed outline through the placed vertices and
    /// the cursor, with a handle on each placed vertex.
    fn render_sketch(&mut self, sketch: &Sketch, view: &MapView, style: &FeatureStyle, transform: Affine) {
        let color = Color::from(style.sketch);
        let path_points = sketch.path();
        let shift = path_points.first().map_or(0.0, |p| view.copy_shift(p.x));

        if sketch.kind == GeometryKind::Polygon && path_points.len() >= 3 {
            let path = screen_path(&path_points, view, shift, true);
            self.scene
                .fill(Fill::NonZero, transform, Color::from(style.fill), None, &path);
        }
        if path_points.len() >= 2 {
            let closed = sketch.kind == GeometryKind::Polygon && path_points.len() >= 3;
            let path = screen_path(&path_points, view, shift, closed);
            let stroke = Stroke::new(style.stroke_width).with_dashes(0.0, [6.0, 4.0]);
            self.scene.stroke(&stroke, transform, color, None, &path);
        }

        for p in &sketch.vertices {
            self.render_vertex(view.shifted_to_screen(*p, shift), color, transform);
        }
        if let Some(cursor) = sketch.cursor {
            let circle = Circle::new(view.shifted_to_screen(cursor, shift), style.point_radius);
            self.scene.fill(Fill::NonZero, transform, color, None, &circle);
        }
    }

    /// White handle with a colored ring.
    fn render_vertex(&mut self, position: Point, color: Color, transform: Affine) {
        let circle = Circle::new(position, VERTEX_RADIUS);
        self.scene.fill(Fill::NonZero, transform, Color::WHITE, None, &circle);
        self.scene.stroke(&Stroke::new(2.0), transform, color, None, &circle);
    }
}

/// Project lon/lat points, moved `shift` degrees east, to a screen-space
/// polyline.
fn screen_path(points: &[Point], view: &MapView, shift: f64, close: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter().map(|p| view.shifted_to_screen(*p, shift));
    if let Some(first) = iter.next() {
        path.move_to(first);
        for p in iter {
            path.line_to(p);
        }
        if close {
            path.close_path();
        }
    }
    path
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();

        // Everything is laid out in logical pixels
        let transform = Affine::scale(ctx.scale_factor);
        let viewport = Rect::from_origin_size(Point::ZERO, ctx.view.viewport_size());
        self.scene.fill(
            Fill::NonZero,
            transform,
            ctx.background_color,
            None,
            &viewport,
        );

        self.render_tiles(ctx, transform);

        for feature in ctx.collection.ordered() {
            self.render_geometry(&feature.geometry, ctx.view, ctx.style, transform);
        }

        if ctx.show_vertices {
            let stroke = Color::from(ctx.style.stroke);
            for feature in ctx.collection.ordered() {
                if feature.kind() == GeometryKind::Point {
                    continue;
                }
                let shift = ctx.view.geometry_shift(&feature.geometry);
                for (_, p) in feature.geometry.vertices() {
                    self.render_vertex(ctx.view.shifted_to_screen(p, shift), stroke, transform);
                }
            }
        }

        if let Some(sketch) = &ctx.sketch {
            self.render_sketch(sketch, ctx.view, ctx.style, transform);
        }

        let hovered = ctx.hovered_vertex.and_then(|(id, vertex)| {
            let geometry = &ctx.collection.get(id)?.geometry;
            Some((geometry.vertex(vertex)?, ctx.view.geometry_shift(geometry)))
        });
        if let Some((p, shift)) = hovered {
            let center = ctx.view.shifted_to_screen(p, shift);
            let halo = Circle::new(center, VERTEX_RADIUS + 3.0);
            self.scene.fill(
                Fill::NonZero,
                transform,
                Color::from(ctx.style.highlight.with_alpha(96)),
                None,
                &halo,
            );
            self.render_vertex(center, Color::from(ctx.style.highlight), transform);
        }
    }
}
