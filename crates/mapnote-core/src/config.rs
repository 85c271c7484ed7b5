//! Map configuration.

use crate::geometry::GeometryKind;
use crate::projection::Crs;
use crate::style::FeatureStyle;
use crate::tiles::TileSource;
use crate::view::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, MapView};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key holding the feature collection.
pub const DEFAULT_STORAGE_KEY: &str = "features";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config IO error: {0}")]
    Io(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}

/// Everything the map session needs to start.
///
/// Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub storage_key: String,
    /// Frame used for the stored payload. In-memory geometry is always lon/lat.
    pub storage_crs: Crs,
    /// Initial view center as `[lon, lat]`.
    pub center: [f64; 2],
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub tiles: TileSource,
    pub default_kind: GeometryKind,
    /// Pick radius for vertices, segments and clicks, in pixels.
    pub pixel_tolerance: f64,
    /// Decoded tiles kept in memory.
    pub tile_cache_capacity: usize,
    pub style: FeatureStyle,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_crs: Crs::Epsg4326,
            center: [78.9629, 20.5937],
            zoom: 4.0,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            tiles: TileSource::default(),
            default_kind: GeometryKind::Point,
            pixel_tolerance: 6.0,
            tile_cache_capacity: 256,
            style: FeatureStyle::default(),
        }
    }
}

impl MapConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, value: String| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        };
        if self.storage_key.trim().is_empty() {
            return Err(invalid("storage_key", format!("{:?}", self.storage_key)));
        }
        if !self.center.iter().all(|c| c.is_finite()) {
            return Err(invalid("center", format!("{:?}", self.center)));
        }
        if !(self.min_zoom.is_finite() && self.max_zoom.is_finite()) || self.min_zoom > self.max_zoom {
            return Err(invalid("zoom limits", format!("{}..{}", self.min_zoom, self.max_zoom)));
        }
        if !self.zoom.is_finite() {
            return Err(invalid("zoom", self.zoom.to_string()));
        }
        if !(self.pixel_tolerance.is_finite() && self.pixel_tolerance > 0.0) {
            return Err(invalid("pixel_tolerance", self.pixel_tolerance.to_string()));
        }
        Ok(())
    }

    /// Apply one `key=value` override, as given in a page URL.
    ///
    /// Recognized keys: `lon`, `lat`, `zoom`, `key`, `type`, `crs`, `tiles`.
    pub fn apply_param(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let number = || value.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(invalid);

        match key {
            "lon" => self.center[0] = number()?,
            "lat" => self.center[1] = number()?,
            "zoom" => self.zoom = number()?,
            "key" if !value.is_empty() => self.storage_key = value.to_string(),
            "type" => self.default_kind = value.parse().map_err(|_| invalid())?,
            "crs" => self.storage_crs = value.parse().map_err(|_| invalid())?,
            "tiles" if value.contains("{z}") => self.tiles = TileSource::new(value),
            "key" | "tiles" => return Err(invalid()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn center_point(&self) -> Point {
        Point::new(self.center[0], self.center[1])
    }

    /// Build the initial view.
    pub fn view(&self) -> MapView {
        MapView::with_zoom_limits(self.center_point(), self.zoom, self.min_zoom, self.max_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapConfig::default();
        assert_eq!(config.storage_key, "features");
        assert_eq!(config.center, [78.9629, 20.5937]);
        assert_eq!(config.zoom, 4.0);
        assert_eq!(config.default_kind, GeometryKind::Point);
        assert_eq!(config.storage_crs, Crs::Epsg4326);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = MapConfig::from_json(r#"{"zoom": 7, "storage_crs": "EPSG:3857"}"#).unwrap();
        assert_eq!(config.zoom, 7.0);
        assert_eq!(config.storage_crs, Crs::Epsg3857);
        assert_eq!(config.storage_key, "features");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(MapConfig::from_json("{"), Err(ConfigError::Json(_))));
        assert!(matches!(
            MapConfig::from_json(r#"{"storage_key": ""}"#),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            MapConfig::from_json(r#"{"min_zoom": 10, "max_zoom": 2}"#),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_apply_params() {
        let mut config = MapConfig::default();
        config.apply_param("lon", "2.35").unwrap();
        config.apply_param("lat", "48.85").unwrap();
        config.apply_param("zoom", "11").unwrap();
        config.apply_param("type", "polygon").unwrap();
        config.apply_param("key", "paris").unwrap();
        assert_eq!(config.center_point(), Point::new(2.35, 48.85));
        assert_eq!(config.zoom, 11.0);
        assert_eq!(config.default_kind, GeometryKind::Polygon);
        assert_eq!(config.storage_key, "paris");

        assert!(config.apply_param("zoom", "abc").is_err());
        assert!(config.apply_param("type", "Circle").is_err());
        assert!(matches!(
            config.apply_param("room", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        // Failed overrides leave the config untouched
        assert_eq!(config.zoom, 11.0);
    }

    #[test]
    fn test_view() {
        let config = MapConfig::default();
        let view = config.view();
        assert_eq!(view.center(), Point::new(78.9629, 20.5937));
        assert_eq!(view.zoom(), 4.0);
    }
}
