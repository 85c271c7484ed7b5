//! Draw tool: builds one new geometry from clicks.

use crate::geometry::{Geometry, GeometryKind};
use crate::projection::wrap_longitude;
use crate::view::MapView;
use kurbo::Point;

/// In-progress drawing, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    pub kind: GeometryKind,
    /// Placed vertices in lon/lat.
    pub vertices: Vec<Point>,
    /// Rubber-band vertex under the pointer.
    pub cursor: Option<Point>,
}

impl Sketch {
    /// Placed vertices followed by the cursor vertex.
    pub fn path(&self) -> Vec<Point> {
        let mut path = self.vertices.clone();
        path.extend(self.cursor);
        path
    }
}

/// Draws geometries of a single kind.
#[derive(Debug, Clone)]
pub struct DrawTool {
    kind: GeometryKind,
    vertices: Vec<Point>,
    cursor: Option<Point>,
}

impl DrawTool {
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            vertices: Vec::new(),
            cursor: None,
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Whether vertices have been placed.
    pub fn is_active(&self) -> bool {
        !self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Track the pointer for the rubber-band vertex.
    pub fn hover(&mut self, lonlat: Point) {
        self.cursor = Some(self.align(lonlat));
    }

    pub fn clear_hover(&mut self) {
        self.cursor = None;
    }

    /// Handle a click. Returns the finished geometry when the click ends
    /// the drawing.
    ///
    /// Clicking the last placed vertex finishes a line; clicking the first
    /// or last vertex finishes a polygon.
    pub fn click(&mut self, lonlat: Point, view: &MapView, tolerance: f64) -> Option<Geometry> {
        let lonlat = self.align(lonlat);
        if self.kind == GeometryKind::Point {
            self.vertices.clear();
            return Geometry::from_vertices(GeometryKind::Point, &[lonlat]);
        }

        let shift = view.copy_shift(self.vertices.first().unwrap_or(&lonlat).x);
        let screen = view.shifted_to_screen(lonlat, shift);
        let near = |p: Option<&Point>| {
            p.is_some_and(|p| (view.shifted_to_screen(*p, shift) - screen).hypot() <= tolerance)
        };
        let on_last = near(self.vertices.last());
        let on_first = self.kind == GeometryKind::Polygon && near(self.vertices.first());

        if on_last || on_first {
            // Too few vertices to close: ignore rather than stack a duplicate
            if self.vertices.len() < self.kind.min_vertices() {
                return None;
            }
            return self.finish();
        }

        self.vertices.push(lonlat);
        None
    }

    /// Finish with the vertices placed so far, if there are enough.
    pub fn finish(&mut self) -> Option<Geometry> {
        let geometry = Geometry::from_vertices(self.kind, &self.vertices)?;
        self.vertices.clear();
        Some(geometry)
    }

    /// Discard the sketch.
    pub fn abort(&mut self) {
        self.vertices.clear();
    }

    /// Bring `lonlat` within half a world of the first placed vertex, or
    /// onto the primary world when nothing is placed yet.
    fn align(&self, lonlat: Point) -> Point {
        let anchor = self.vertices.first().map_or(0.0, |p| p.x);
        let rel = lonlat.x - anchor;
        if rel.abs() <= 180.0 {
            return lonlat;
        }
        Point::new(lonlat.x + (wrap_longitude(rel) - rel).round(), lonlat.y)
    }

    /// Drop the last placed vertex.
    pub fn undo_vertex(&mut self) -> bool {
        self.vertices.pop().is_some()
    }

    pub fn sketch(&self) -> Option<Sketch> {
        if self.vertices.is_empty() && self.cursor.is_none() {
            return None;
        }
        Some(Sketch {
            kind: self.kind,
            vertices: self.vertices.clone(),
            cursor: self.cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;

    fn view() -> MapView {
        let mut view = MapView::new(Point::new(78.9629, 20.5937), 4.0);
        view.set_viewport_size(Size::new(800.0, 600.0));
        view
    }

    #[test]
    fn test_point_finishes_on_click() {
        let view = view();
        let mut tool = DrawTool::new(GeometryKind::Point);
        let geom = tool.click(Point::new(78.9629, 20.5937), &view, 6.0);
        assert_eq!(geom, Some(Geometry::Point(Point::new(78.9629, 20.5937))));
        assert!(!tool.is_active());
    }

    #[test]
    fn test_line_finishes_on_last_vertex() {
        let view = view();
        let mut tool = DrawTool::new(GeometryKind::LineString);
        assert!(tool.click(Point::new(70.0, 20.0), &view, 6.0).is_none());
        // Re-clicking a lone vertex does nothing
        assert!(tool.click(Point::new(70.0, 20.0), &view, 6.0).is_none());
        assert_eq!(tool.vertices().len(), 1);
        assert!(tool.click(Point::new(80.0, 25.0), &view, 6.0).is_none());
        let geom = tool.click(Point::new(80.0, 25.0), &view, 6.0).unwrap();
        assert_eq!(
            geom,
            Geometry::LineString(vec![Point::new(70.0, 20.0), Point::new(80.0, 25.0)])
        );
        assert!(!tool.is_active());
    }

    #[test]
    fn test_polygon_finishes_on_first_vertex() {
        let view = view();
        let mut tool = DrawTool::new(GeometryKind::Polygon);
        tool.click(Point::new(70.0, 15.0), &view, 6.0);
        tool.click(Point::new(85.0, 15.0), &view, 6.0);
        assert!(tool.finish().is_none());
        // Clicking the first vertex with only two placed is ignored
        assert!(tool.click(Point::new(70.0, 15.0), &view, 6.0).is_none());
        assert_eq!(tool.vertices().len(), 2);
        tool.click(Point::new(78.0, 28.0), &view, 6.0);
        let geom = tool.click(Point::new(70.0, 15.0), &view, 6.0).unwrap();
        assert_eq!(geom.kind(), GeometryKind::Polygon);
        assert_eq!(geom.vertex_count(), 3);
    }

    #[test]
    fn test_finish_and_abort() {
        let view = view();
        let mut tool = DrawTool::new(GeometryKind::LineString);
        tool.click(Point::new(70.0, 20.0), &view, 6.0);
        assert!(tool.finish().is_none());
        assert!(tool.is_active());
        tool.abort();
        assert!(!tool.is_active());

        tool.click(Point::new(70.0, 20.0), &view, 6.0);
        tool.click(Point::new(75.0, 20.0), &view, 6.0);
        tool.click(Point::new(80.0, 20.0), &view, 6.0);
        assert!(tool.undo_vertex());
        let geom = tool.finish().unwrap();
        assert_eq!(geom.vertex_count(), 2);
    }

    #[test]
    fn test_sketch_includes_cursor() {
        let view = view();
        let mut tool = DrawTool::new(GeometryKind::Polygon);
        assert!(tool.sketch().is_none());
        tool.click(Point::new(70.0, 20.0), &view, 6.0);
        tool.hover(Point::new(72.0, 22.0));
        let sketch = tool.sketch().unwrap();
        assert_eq!(sketch.path(), vec![Point::new(70.0, 20.0), Point::new(72.0, 22.0)]);
    }

    #[test]
    fn test_clicks_stay_on_the_first_vertex_world() {
        let mut view = MapView::new(Point::new(179.0, 0.0), 4.0);
        view.set_viewport_size(Size::new(800.0, 600.0));
        let mut tool = DrawTool::new(GeometryKind::LineString);
        tool.click(Point::new(179.0, 0.0), &view, 6.0);
        // A click reported on the far side of the antimeridian
        tool.click(Point::new(-179.0, 0.0), &view, 6.0);
        assert_eq!(tool.vertices(), &[Point::new(179.0, 0.0), Point::new(181.0, 0.0)]);

        tool.hover(Point::new(-178.0, 1.0));
        assert_eq!(tool.sketch().unwrap().cursor, Some(Point::new(182.0, 1.0)));

        let mut points = DrawTool::new(GeometryKind::Point);
        assert_eq!(
            points.click(Point::new(200.0, 5.0), &view, 6.0),
            Some(Geometry::Point(Point::new(-160.0, 5.0)))
        );
    }
}
