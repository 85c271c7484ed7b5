//! Per-feature delete controls.

use crate::feature::{Feature, FeatureId};
use crate::view::MapView;
use kurbo::Point;
use std::collections::HashMap;

/// Height of the delete button in logical pixels.
pub const DELETE_CONTROL_SIZE: f64 = 25.0;

/// A delete button anchored to a feature's first coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeleteControl {
    pub feature: FeatureId,
    /// Anchor in lon/lat.
    pub anchor: Point,
}

impl DeleteControl {
    /// Screen position of the anchor on the world copy nearest the view
    /// center. The button is centered on it.
    pub fn screen_position(&self, view: &MapView) -> Point {
        view.shifted_to_screen(self.anchor, view.copy_shift(self.anchor.x))
    }
}

/// Delete controls keyed by feature.
#[derive(Debug, Clone, Default)]
pub struct DeleteControls {
    controls: HashMap<FeatureId, DeleteControl>,
}

impl DeleteControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the control for `feature`, replacing any existing one.
    pub fn attach(&mut self, feature: &Feature) {
        let Some(anchor) = feature.geometry.first_coordinate() else {
            return;
        };
        self.controls.insert(
            feature.id,
            DeleteControl {
                feature: feature.id,
                anchor,
            },
        );
    }

    /// Re-derive the anchor after a geometry change.
    pub fn sync(&mut self, feature: &Feature) {
        if let (Some(control), Some(anchor)) = (
            self.controls.get_mut(&feature.id),
            feature.geometry.first_coordinate(),
        ) {
            control.anchor = anchor;
        }
    }

    pub fn detach(&mut self, id: FeatureId) -> Option<DeleteControl> {
        self.controls.remove(&id)
    }

    pub fn get(&self, id: FeatureId) -> Option<&DeleteControl> {
        self.controls.get(&id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.controls.contains_key(&id)
    }

    /// Controls following `ids`, so buttons stack like their features.
    pub fn in_order<'a>(
        &'a self,
        ids: &'a [FeatureId],
    ) -> impl Iterator<Item = &'a DeleteControl> + 'a {
        ids.iter().filter_map(|id| self.controls.get(id))
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn clear(&mut self) {
        self.controls.clear();
    }
}
