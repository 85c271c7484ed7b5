//! Modify tool: drag existing vertices, insert new ones on segments.

use crate::collection::FeatureCollection;
use crate::feature::{Feature, FeatureId};
use crate::geometry::{Geometry, VertexRef, distance_to_segment};
use crate::view::MapView;
use kurbo::Point;

/// What a press would grab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModifyHit {
    /// An existing vertex.
    Vertex { feature: FeatureId, vertex: VertexRef },
    /// A point on a segment; grabbing inserts a vertex at `insert_at`.
    Segment {
        feature: FeatureId,
        insert_at: VertexRef,
        position: Point,
    },
}

impl ModifyHit {
    pub fn feature(&self) -> FeatureId {
        match *self {
            ModifyHit::Vertex { feature, .. } | ModifyHit::Segment { feature, .. } => feature,
        }
    }
}

#[derive(Debug, Clone)]
struct VertexDrag {
    feature: FeatureId,
    vertex: VertexRef,
    /// Geometry before the press, to detect a no-op and to cancel.
    original: Geometry,
    /// Longitude offset of the world copy the feature was grabbed on.
    shift: f64,
}

/// Edits the vertices of any feature in the collection.
#[derive(Debug, Clone, Default)]
pub struct ModifyTool {
    drag: Option<VertexDrag>,
}

impl ModifyTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Feature and vertex being dragged.
    pub fn dragged(&self) -> Option<(FeatureId, VertexRef)> {
        self.drag.as_ref().map(|d| (d.feature, d.vertex))
    }

    /// Find what a press at `screen` would grab. Vertices win over segments;
    /// topmost features win over lower ones.
    pub fn hit(
        &self,
        collection: &FeatureCollection,
        view: &MapView,
        screen: Point,
        tolerance: f64,
    ) -> Option<ModifyHit> {
        for feature in topmost_first(collection) {
            let shift = view.geometry_shift(&feature.geometry);
            let nearest = feature
                .geometry
                .vertices()
                .into_iter()
                .map(|(at, p)| (at, (view.shifted_to_screen(p, shift) - screen).hypot()))
                .filter(|(_, d)| *d <= tolerance)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((vertex, _)) = nearest {
                return Some(ModifyHit::Vertex {
                    feature: feature.id,
                    vertex,
                });
            }
        }

        for feature in topmost_first(collection) {
            let shift = view.geometry_shift(&feature.geometry);
            let nearest = feature
                .geometry
                .segments()
                .into_iter()
                .map(|s| {
                    let a = view.shifted_to_screen(s.start, shift);
                    let b = view.shifted_to_screen(s.end, shift);
                    let (d, closest) = distance_to_segment(screen, a, b);
                    (s.insert_at, d, closest)
                })
                .filter(|(_, d, _)| *d <= tolerance)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((insert_at, _, closest)) = nearest {
                let lonlat = view.screen_to_lonlat(closest);
                return Some(ModifyHit::Segment {
                    feature: feature.id,
                    insert_at,
                    position: Point::new(lonlat.x - shift, lonlat.y),
                });
            }
        }
        None
    }

    /// Start a drag at `screen`. Returns the grabbed feature, or None if
    /// nothing is within reach.
    pub fn begin(
        &mut self,
        collection: &mut FeatureCollection,
        view: &MapView,
        screen: Point,
        tolerance: f64,
    ) -> Option<FeatureId> {
        let hit = self.hit(collection, view, screen, tolerance)?;
        let feature = collection.get_mut(hit.feature())?;
        let original = feature.geometry.clone();
        let shift = view.geometry_shift(&original);

        let vertex = match hit {
            ModifyHit::Vertex { vertex, .. } => vertex,
            ModifyHit::Segment {
                insert_at,
                position,
                ..
            } => {
                if !feature.geometry.insert_vertex(insert_at, position) {
                    return None;
                }
                insert_at
            }
        };

        self.drag = Some(VertexDrag {
            feature: feature.id,
            vertex,
            original,
            shift,
        });
        Some(feature.id)
    }

    /// Move the grabbed vertex to `lonlat`, given in the world copy the
    /// view is centered on. Returns the feature whose geometry changed.
    pub fn drag(&mut self, collection: &mut FeatureCollection, lonlat: Point) -> Option<FeatureId> {
        let drag = self.drag.as_ref()?;
        let feature = collection.get_mut(drag.feature)?;
        let stored = Point::new(lonlat.x - drag.shift, lonlat.y);
        feature
            .geometry
            .set_vertex(drag.vertex, stored)
            .then_some(drag.feature)
    }

    /// Release. Returns the feature if its geometry differs from before the
    /// press (the modification is complete). A shape dragged off the primary
    /// world is moved back onto it.
    pub fn end(&mut self, collection: &mut FeatureCollection) -> Option<FeatureId> {
        let drag = self.drag.take()?;
        let feature = collection.get_mut(drag.feature)?;
        let changed = feature.geometry != drag.original;
        if changed {
            feature.geometry.wrap_into_world();
        }
        changed.then_some(drag.feature)
    }

    /// Abort a drag, restoring the geometry.
    pub fn cancel(&mut self, collection: &mut FeatureCollection) -> Option<FeatureId> {
        let drag = self.drag.take()?;
        let feature = collection.get_mut(drag.feature)?;
        feature.geometry = drag.original;
        Some(drag.feature)
    }

    /// Forget a drag on a feature that no longer exists.
    pub fn forget(&mut self, id: FeatureId) {
        if self.drag.as_ref().is_some_and(|d| d.feature == id) {
            self.drag = None;
        }
    }
}

fn topmost_first(collection: &FeatureCollection) -> impl Iterator<Item = &Feature> {
    collection
        .ids()
        .iter()
        .rev()
        .filter_map(move |id| collection.get(*id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;

    fn setup() -> (FeatureCollection, MapView, FeatureId) {
        let mut view = MapView::new(Point::new(75.0, 20.0), 5.0);
        view.set_viewport_size(Size::new(800.0, 600.0));
        let mut fc = FeatureCollection::new();
        let line = Feature::new(Geometry::LineString(vec![
            Point::new(72.0, 20.0),
            Point::new(78.0, 20.0),
        ]));
        let id = line.id;
        fc.add(line);
        (fc, view, id)
    }

    #[test]
    fn test_hit_vertex_before_segment() {
        let (fc, view, id) = setup();
        let tool = ModifyTool::new();
        let screen = view.lonlat_to_screen(Point::new(78.0, 20.0));
        assert_eq!(
            tool.hit(&fc, &view, screen, 6.0),
            Some(ModifyHit::Vertex {
                feature: id,
                vertex: VertexRef::new(0, 1)
            })
        );

        let mid = view.lonlat_to_screen(Point::new(75.0, 20.0));
        assert!(matches!(
            tool.hit(&fc, &view, mid, 6.0),
            Some(ModifyHit::Segment { insert_at, .. }) if insert_at == VertexRef::new(0, 1)
        ));

        let away = view.lonlat_to_screen(Point::new(75.0, 25.0));
        assert!(tool.hit(&fc, &view, away, 6.0).is_none());
    }

    #[test]
    fn test_drag_vertex() {
        let (mut fc, view, id) = setup();
        let mut tool = ModifyTool::new();
        let start = view.lonlat_to_screen(Point::new(78.0, 20.0));
        assert_eq!(tool.begin(&mut fc, &view, start, 6.0), Some(id));
        assert!(tool.is_dragging());

        assert_eq!(tool.drag(&mut fc, Point::new(79.0, 22.0)), Some(id));
        assert_eq!(tool.end(&mut fc), Some(id));
        assert!(!tool.is_dragging());
        assert_eq!(
            fc.get(id).unwrap().geometry.vertex(VertexRef::new(0, 1)),
            Some(Point::new(79.0, 22.0))
        );
    }

    #[test]
    fn test_press_release_on_vertex_is_not_a_modification() {
        let (mut fc, view, id) = setup();
        let mut tool = ModifyTool::new();
        let start = view.lonlat_to_screen(Point::new(72.0, 20.0));
        assert_eq!(tool.begin(&mut fc, &view, start, 6.0), Some(id));
        assert_eq!(tool.end(&mut fc), None);
    }

    #[test]
    fn test_segment_press_inserts_vertex() {
        let (mut fc, view, id) = setup();
        let mut tool = ModifyTool::new();
        let mid = view.lonlat_to_screen(Point::new(75.0, 20.0));
        tool.begin(&mut fc, &view, mid, 6.0);
        assert_eq!(fc.get(id).unwrap().geometry.vertex_count(), 3);
        assert_eq!(tool.dragged(), Some((id, VertexRef::new(0, 1))));
        // Inserting counts as a modification even without moving
        assert_eq!(tool.end(&mut fc), Some(id));
    }

    #[test]
    fn test_cancel_restores() {
        let (mut fc, view, id) = setup();
        let before = fc.get(id).unwrap().geometry.clone();
        let mut tool = ModifyTool::new();
        let start = view.lonlat_to_screen(Point::new(72.0, 20.0));
        tool.begin(&mut fc, &view, start, 6.0);
        tool.drag(&mut fc, Point::new(60.0, 10.0));
        assert_eq!(tool.cancel(&mut fc), Some(id));
        assert_eq!(fc.get(id).unwrap().geometry, before);
    }

    #[test]
    fn test_drag_on_neighbouring_world_copy() {
        let mut view = MapView::new(Point::new(179.0, 0.0), 4.0);
        view.set_viewport_size(Size::new(800.0, 600.0));
        let mut fc = FeatureCollection::new();
        let line = Feature::new(Geometry::LineString(vec![
            Point::new(-179.0, 0.0),
            Point::new(-170.0, 0.0),
        ]));
        let id = line.id;
        fc.add(line);

        // The line shows east of the center, one world over
        let mut tool = ModifyTool::new();
        let start = view.lonlat_to_screen(Point::new(181.0, 0.0));
        assert_eq!(tool.begin(&mut fc, &view, start, 6.0), Some(id));

        // Drag the first vertex west across the antimeridian
        tool.drag(&mut fc, Point::new(178.0, 1.0));
        assert_eq!(
            fc.get(id).unwrap().geometry.vertex(VertexRef::new(0, 0)),
            Some(Point::new(-182.0, 1.0))
        );
        assert_eq!(tool.end(&mut fc), Some(id));

        // Stored back on the primary world with the shape intact
        let geometry = &fc.get(id).unwrap().geometry;
        assert_eq!(geometry.vertex(VertexRef::new(0, 0)), Some(Point::new(178.0, 1.0)));
        assert_eq!(geometry.vertex(VertexRef::new(0, 1)), Some(Point::new(190.0, 0.0)));
    }
}
