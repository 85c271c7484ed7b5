//! Map view: pan/zoom state and screen placement.
//!
//! World pixel space is the standard 256-px tile pyramid: at zoom `z` the
//! whole Web Mercator square is `256 * 2^z` pixels wide.

use crate::geometry::Geometry;
use crate::projection::{clamp_latitude, lonlat_to_unit, unit_to_lonlat, wrap_longitude};
use crate::tiles::{MAX_TILE_ZOOM, PlacedTile, TILE_SIZE, TileId};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default zoom limits (the OpenStreetMap tile server serves 0..=19).
pub const DEFAULT_MIN_ZOOM: f64 = 0.0;
pub const DEFAULT_MAX_ZOOM: f64 = 19.0;

/// Zoom levels gained per wheel notch.
pub const ZOOM_STEP: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapView {
    /// View center in lon/lat degrees.
    center: Point,
    /// Fractional zoom level.
    zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Viewport size in logical pixels.
    viewport: Size,
}

impl Default for MapView {
    fn default() -> Self {
        Self::new(Point::ZERO, 2.0)
    }
}

impl MapView {
    pub fn new(center: Point, zoom: f64) -> Self {
        Self::with_zoom_limits(center, zoom, DEFAULT_MIN_ZOOM, DEFAULT_MAX_ZOOM)
    }

    pub fn with_zoom_limits(center: Point, zoom: f64, min_zoom: f64, max_zoom: f64) -> Self {
        let (min_zoom, max_zoom) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        Self {
            center: normalize_center(center),
            zoom: zoom.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            viewport: Size::new(1.0, 1.0),
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn set_center(&mut self, center: Point) {
        self.center = normalize_center(center);
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom level, clamped to the limits.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport = Size::new(size.width.max(1.0), size.height.max(1.0));
    }

    /// Width of the world in pixels at the current zoom.
    pub fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    /// Projected meters per pixel at the current zoom.
    pub fn resolution(&self) -> f64 {
        2.0 * crate::projection::HALF_WORLD_METERS / self.world_size()
    }

    /// Transform from normalized world space (`[0,1]²`) to screen pixels.
    pub fn unit_to_screen(&self) -> Affine {
        let ws = self.world_size();
        let c = lonlat_to_unit(self.center);
        let half = Vec2::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        Affine::translate(half - c.to_vec2() * ws) * Affine::scale(ws)
    }

    pub fn lonlat_to_screen(&self, lonlat: Point) -> Point {
        self.unit_to_screen() * lonlat_to_unit(lonlat)
    }

    /// Inverse of [`lonlat_to_screen`](Self::lonlat_to_screen). Longitudes are
    /// not wrapped, so the round trip is exact across the antimeridian.
    pub fn screen_to_lonlat(&self, screen: Point) -> Point {
        unit_to_lonlat(self.unit_to_screen().inverse() * screen)
    }

    /// Longitude shift, in whole turns, that moves `lon` into the world copy
    /// nearest the view center.
    pub fn copy_shift(&self, lon: f64) -> f64 {
        let rel = lon - self.center.x;
        if rel.abs() <= 180.0 {
            return 0.0;
        }
        (wrap_longitude(rel) - rel).round()
    }

    /// Shift for a whole shape. The first coordinate picks the copy so every
    /// vertex of the shape moves together.
    pub fn geometry_shift(&self, geometry: &Geometry) -> f64 {
        geometry
            .first_coordinate()
            .map_or(0.0, |p| self.copy_shift(p.x))
    }

    /// Screen position of `lonlat` drawn `shift` degrees east.
    pub fn shifted_to_screen(&self, lonlat: Point, shift: f64) -> Point {
        self.lonlat_to_screen(Point::new(lonlat.x + shift, lonlat.y))
    }

    /// Pan by a screen-space delta (content follows the pointer).
    pub fn pan(&mut self, delta: Vec2) {
        let c = lonlat_to_unit(self.center) - delta / self.world_size();
        self.center = normalize_center(unit_to_lonlat(Point::new(c.x, c.y.clamp(0.0, 1.0))));
    }

    /// Zoom by `factor` (2.0 = one level in), keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        if factor <= 0.0 {
            return;
        }
        let new_zoom = (self.zoom + factor.log2()).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let anchor = lonlat_to_unit(self.screen_to_lonlat(screen));
        self.zoom = new_zoom;

        // Move the center so `anchor` lands back under `screen`
        let half = Vec2::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        let c = anchor - (screen.to_vec2() - half) / self.world_size();
        self.center = normalize_center(unit_to_lonlat(c));
    }

    /// Fit the view to a lon/lat bounding box with `padding` pixels on each side.
    pub fn fit_to_bounds(&mut self, bounds: Rect, padding: f64) {
        let a = lonlat_to_unit(Point::new(bounds.x0, bounds.y1));
        let b = lonlat_to_unit(Point::new(bounds.x1, bounds.y0));
        let unit = Rect::from_points(a, b);

        self.center = normalize_center(unit_to_lonlat(unit.center()));
        if unit.width() <= f64::EPSILON && unit.height() <= f64::EPSILON {
            return;
        }

        let avail = Size::new(
            (self.viewport.width - padding * 2.0).max(1.0),
            (self.viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = avail.width / (unit.width().max(f64::EPSILON) * TILE_SIZE);
        let scale_y = avail.height / (unit.height().max(f64::EPSILON) * TILE_SIZE);
        self.set_zoom(scale_x.min(scale_y).log2());
    }

    /// Integer tile zoom used for the basemap at the current view zoom.
    pub fn tile_zoom(&self) -> u8 {
        self.zoom.round().clamp(0.0, MAX_TILE_ZOOM as f64) as u8
    }

    /// Every tile covering the viewport, with its screen rectangle.
    ///
    /// Columns outside the world are wrapped horizontally; rows outside the
    /// world are skipped.
    pub fn visible_tiles(&self) -> Vec<PlacedTile> {
        let z = self.tile_zoom();
        let n = 1i64 << z;
        let nf = n as f64;
        let to_screen = self.unit_to_screen();
        let to_unit = to_screen.inverse();

        let top_left = to_unit * Point::ZERO;
        let bottom_right = to_unit * Point::new(self.viewport.width, self.viewport.height);

        let x0 = (top_left.x * nf).floor() as i64;
        let x1 = (bottom_right.x * nf).ceil() as i64 - 1;
        let y0 = ((top_left.y * nf).floor() as i64).max(0);
        let y1 = ((bottom_right.y * nf).ceil() as i64 - 1).min(n - 1);

        let mut tiles = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let origin = to_screen * Point::new(x as f64 / nf, y as f64 / nf);
                let corner = to_screen * Point::new((x + 1) as f64 / nf, (y + 1) as f64 / nf);
                tiles.push(PlacedTile {
                    id: TileId::wrapped(z, x, y as u32),
                    rect: Rect::from_points(origin, corner),
                });
            }
        }
        tiles
    }
}

/// Keep the center on the primary world copy.
fn normalize_center(center: Point) -> Point {
    Point::new(wrap_longitude(center.x), clamp_latitude(center.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_at(center: Point, zoom: f64) -> MapView {
        let mut view = MapView::new(center, zoom);
        view.set_viewport_size(Size::new(800.0, 600.0));
        view
    }

    fn assert_close(a: Point, b: Point, eps: f64) {
        assert!((a.x - b.x).abs() < eps, "{:?} != {:?}", a, b);
        assert!((a.y - b.y).abs() < eps, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_center_maps_to_viewport_center() {
        let center = Point::new(78.9629, 20.5937);
        let view = view_at(center, 4.0);
        assert_close(view.lonlat_to_screen(center), Point::new(400.0, 300.0), 1e-6);
    }

    #[test]
    fn test_screen_roundtrip() {
        let view = view_at(Point::new(78.9629, 20.5937), 6.5);
        let screen = Point::new(123.0, 456.0);
        let back = view.lonlat_to_screen(view.screen_to_lonlat(screen));
        assert_close(back, screen, 1e-6);
    }

    #[test]
    fn test_world_size_and_resolution() {
        let view = view_at(Point::ZERO, 0.0);
        assert!((view.world_size() - 256.0).abs() < 1e-9);
        assert!((view.resolution() - 156_543.033_928).abs() < 1e-3);
    }

    #[test]
    fn test_pan_moves_content_with_pointer() {
        let mut view = view_at(Point::new(10.0, 10.0), 5.0);
        let target = Point::new(12.0, 11.0);
        let before = view.lonlat_to_screen(target);
        view.pan(Vec2::new(40.0, -25.0));
        let after = view.lonlat_to_screen(target);
        assert_close(after, before + Vec2::new(40.0, -25.0), 1e-6);
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut view = view_at(Point::new(78.9629, 20.5937), 4.0);
        let cursor = Point::new(200.0, 150.0);
        let anchor = view.screen_to_lonlat(cursor);
        view.zoom_at(cursor, 2.0);
        assert!((view.zoom() - 5.0).abs() < 1e-12);
        assert_close(view.lonlat_to_screen(anchor), cursor, 1e-6);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut view = view_at(Point::ZERO, 4.0);
        view.zoom_at(Point::ZERO, 1e-9);
        assert!((view.zoom() - view.min_zoom).abs() < f64::EPSILON);
        view.set_zoom(100.0);
        assert!((view.zoom() - view.max_zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_bounds() {
        let mut view = view_at(Point::ZERO, 2.0);
        let bounds = Rect::new(70.0, 10.0, 90.0, 30.0);
        view.fit_to_bounds(bounds, 20.0);
        for corner in [Point::new(70.0, 10.0), Point::new(90.0, 30.0)] {
            let s = view.lonlat_to_screen(corner);
            assert!(s.x >= 19.0 && s.x <= 781.0, "{:?}", s);
            assert!(s.y >= 19.0 && s.y <= 581.0, "{:?}", s);
        }
    }

    #[test]
    fn test_visible_tiles_cover_viewport() {
        let view = view_at(Point::new(78.9629, 20.5937), 4.0);
        let tiles = view.visible_tiles();
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.id.z == 4));
        assert!(tiles.iter().all(|t| (t.rect.width() - 256.0).abs() < 1e-6));

        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
        let union = tiles.iter().map(|t| t.rect).reduce(|a, b| a.union(b)).unwrap();
        assert!(union.contains(viewport.origin()));
        assert!(union.x1 >= viewport.x1 && union.y1 >= viewport.y1);
    }

    #[test]
    fn test_pan_across_world_keeps_center_on_primary_copy() {
        let mut view = view_at(Point::new(78.9629, 20.5937), 4.0);
        let world = view.world_size();
        view.pan(Vec2::new(-world, 0.0));
        assert!((view.center().x - 78.9629).abs() < 1e-6, "{:?}", view.center());

        view.pan(Vec2::new(-world * 0.3, 0.0));
        assert!((-180.0..180.0).contains(&view.center().x));
    }

    #[test]
    fn test_copy_shift_picks_nearest_world() {
        let view = view_at(Point::new(175.0, 0.0), 3.0);
        assert_eq!(view.copy_shift(170.0), 0.0);
        assert_eq!(view.copy_shift(-175.0), 360.0);

        // A shape just across the antimeridian lands right of the center
        let line = Geometry::LineString(vec![Point::new(-178.0, 0.0), Point::new(-170.0, 0.0)]);
        let shift = view.geometry_shift(&line);
        let screen = view.shifted_to_screen(Point::new(-178.0, 0.0), shift);
        assert!(screen.x > 400.0 && screen.x < 800.0, "{:?}", screen);
    }

    #[test]
    fn test_visible_tiles_wrap_x() {
        let view = view_at(Point::new(179.0, 0.0), 2.0);
        let tiles = view.visible_tiles();
        assert!(tiles.iter().all(|t| t.id.x < 4));
        assert!(tiles.iter().any(|t| t.id.x == 0));
        assert!(tiles.iter().any(|t| t.id.x == 3));
    }
}
