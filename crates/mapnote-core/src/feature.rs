//! Features: an identified geometry with free-form properties.

use crate::geometry::{Geometry, GeometryKind};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique identifier for features.
pub type FeatureId = Uuid;

/// A single annotation on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    /// GeoJSON `properties`, kept verbatim across load and save.
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Create a feature with a fresh id and no properties.
    pub fn new(geometry: Geometry) -> Self {
        Self::with_id(Uuid::new_v4(), geometry)
    }

    pub fn with_id(id: FeatureId, geometry: Geometry) -> Self {
        Self {
            id,
            geometry,
            properties: Map::new(),
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.geometry.kind()
    }
}
