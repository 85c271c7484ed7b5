//! Raster tile addressing.

use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge length of a basemap tile in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Highest tile zoom level we ever request.
pub const MAX_TILE_ZOOM: u8 = 22;

/// Default basemap: OpenStreetMap standard tiles.
pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Address of one tile in the XYZ pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub const fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Build a tile id from an unbounded column, wrapping it into the world.
    pub fn wrapped(z: u8, x: i64, y: u32) -> Self {
        let n = 1i64 << z;
        Self {
            z,
            x: x.rem_euclid(n) as u32,
            y,
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A tile placed on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub id: TileId,
    /// Screen rectangle in logical pixels.
    pub rect: Rect,
}

/// Where tiles come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSource {
    /// URL template with `{z}`, `{x}` and `{y}` placeholders.
    /// `{s}` is replaced by a subdomain from `subdomains`.
    pub url_template: String,
    #[serde(default)]
    pub subdomains: Vec<String>,
    #[serde(default = "default_attribution")]
    pub attribution: String,
}

fn default_attribution() -> String {
    "© OpenStreetMap contributors".to_string()
}

impl Default for TileSource {
    fn default() -> Self {
        Self::new(OSM_TILE_URL)
    }
}

impl TileSource {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            subdomains: Vec::new(),
            attribution: default_attribution(),
        }
    }

    /// Resolve the URL of a tile.
    pub fn url(&self, tile: TileId) -> String {
        let mut url = self
            .url_template
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string());
        if !self.subdomains.is_empty() {
            let idx = (tile.x as usize + tile.y as usize) % self.subdomains.len();
            url = url.replace("{s}", &self.subdomains[idx]);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osm_url() {
        let source = TileSource::default();
        assert_eq!(
            source.url(TileId::new(4, 11, 7)),
            "https://tile.openstreetmap.org/4/11/7.png"
        );
    }

    #[test]
    fn test_subdomains() {
        let mut source = TileSource::new("https://{s}.tile.example.org/{z}/{x}/{y}.png");
        source.subdomains = vec!["a".into(), "b".into()];
        assert_eq!(source.url(TileId::new(1, 0, 0)), "https://a.tile.example.org/1/0/0.png");
        assert_eq!(source.url(TileId::new(1, 1, 0)), "https://b.tile.example.org/1/1/0.png");
    }

    #[test]
    fn test_wrapped() {
        assert_eq!(TileId::wrapped(2, -1, 0).x, 3);
        assert_eq!(TileId::wrapped(2, 4, 0).x, 0);
        assert_eq!(TileId::wrapped(0, 5, 0).x, 0);
    }
}
