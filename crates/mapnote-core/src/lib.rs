//! MapNote Core Library
//!
//! Platform-agnostic data structures and logic for the MapNote annotation map:
//! features and their GeoJSON encoding, map view math, draw and modify
//! interactions, delete controls and persistence.

pub mod collection;
pub mod config;
pub mod controls;
pub mod feature;
pub mod geojson;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod persistence;
pub mod projection;
pub mod session;
pub mod storage;
pub mod style;
pub mod tiles;
pub mod view;

pub use collection::FeatureCollection;
pub use config::{ConfigError, MapConfig};
pub use controls::{DeleteControl, DeleteControls};
pub use feature::{Feature, FeatureId};
pub use geojson::GeoJsonError;
pub use geometry::{Geometry, GeometryKind, ParseGeometryKindError, VertexRef};
pub use input::{ClickTracker, MouseButton, PointerEvent};
pub use interaction::{DrawTool, Interaction, Interactions, ModifyTool, Sketch};
pub use persistence::{LoadOutcome, Persistence};
pub use projection::Crs;
pub use session::{MapEvent, MapSession};
pub use style::{FeatureStyle, SerializableColor};
pub use tiles::{PlacedTile, TileId, TileSource};
pub use view::MapView;
