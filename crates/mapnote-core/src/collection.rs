//! Ordered feature collection.

use crate::feature::{Feature, FeatureId};
use crate::geometry::{Geometry, distance_to_segment};
use crate::view::MapView;
use kurbo::{Point, Rect};
use std::collections::HashMap;

/// The editable feature set.
///
/// Insertion order is both render order (back to front) and encode order.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    features: HashMap<FeatureId, Feature>,
    order: Vec<FeatureId>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature on top. A feature with the same id is replaced in place.
    pub fn add(&mut self, feature: Feature) {
        let id = feature.id;
        if self.features.insert(id, feature).is_none() {
            self.order.push(id);
        }
    }

    pub fn extend(&mut self, features: impl IntoIterator<Item = Feature>) {
        for feature in features {
            self.add(feature);
        }
    }

    pub fn remove(&mut self, id: FeatureId) -> Option<Feature> {
        let removed = self.features.remove(&id)?;
        self.order.retain(|&f| f != id);
        Some(removed)
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    pub fn get_mut(&mut self, id: FeatureId) -> Option<&mut Feature> {
        self.features.get_mut(&id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.features.contains_key(&id)
    }

    /// Features in insertion order (back to front).
    pub fn ordered(&self) -> impl Iterator<Item = &Feature> {
        self.order.iter().filter_map(|id| self.features.get(id))
    }

    pub fn ids(&self) -> &[FeatureId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.order.clear();
    }

    /// Bounding box of all features in degrees, None when empty.
    pub fn bounds(&self) -> Option<Rect> {
        self.ordered()
            .map(|f| f.geometry.bounds())
            .reduce(|a, b| a.union(b))
    }

    /// Features under a screen position, topmost first.
    ///
    /// Points and lines hit within `tolerance` pixels; polygons also hit
    /// anywhere inside.
    pub fn features_at(&self, view: &MapView, screen: Point, tolerance: f64) -> Vec<FeatureId> {
        self.order
            .iter()
            .rev()
            .filter(|id| {
                self.features
                    .get(id)
                    .is_some_and(|f| hits(&f.geometry, view, screen, tolerance))
            })
            .copied()
            .collect()
    }
}

fn hits(geometry: &Geometry, view: &MapView, screen: Point, tolerance: f64) -> bool {
    let shift = view.geometry_shift(geometry);
    match geometry {
        Geometry::Point(p) => (view.shifted_to_screen(*p, shift) - screen).hypot() <= tolerance,
        Geometry::LineString(_) | Geometry::Polygon(_) => {
            let near_edge = geometry.segments().iter().any(|s| {
                let a = view.shifted_to_screen(s.start, shift);
                let b = view.shifted_to_screen(s.end, shift);
                distance_to_segment(screen, a, b).0 <= tolerance
            });
            let lonlat = view.screen_to_lonlat(screen);
            near_edge || geometry.contains(Point::new(lonlat.x - shift, lonlat.y))
        }
    }
}
