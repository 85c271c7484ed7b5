//! Coordinate reference frames.
//!
//! In-memory geometry is always geographic (EPSG:4326, `x` = lon, `y` = lat).
//! Spherical Web Mercator (EPSG:3857) is used for screen placement and as an
//! optional storage frame.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Earth radius used by spherical Web Mercator, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of the Web Mercator square.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Half the width of the Web Mercator square, in meters.
pub const HALF_WORLD_METERS: f64 = PI * EARTH_RADIUS;

/// Supported coordinate reference frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Crs {
    /// Geographic longitude/latitude in degrees.
    #[default]
    #[serde(rename = "EPSG:4326")]
    Epsg4326,
    /// Spherical Web Mercator in meters.
    #[serde(rename = "EPSG:3857")]
    Epsg3857,
}

impl Crs {
    pub fn code(self) -> &'static str {
        match self {
            Crs::Epsg4326 => "EPSG:4326",
            Crs::Epsg3857 => "EPSG:3857",
        }
    }

    /// Convert a coordinate in this frame to lon/lat degrees.
    pub fn to_lonlat(self, p: Point) -> Point {
        match self {
            Crs::Epsg4326 => p,
            Crs::Epsg3857 => mercator_to_lonlat(p),
        }
    }

    /// Convert lon/lat degrees into this frame.
    pub fn from_lonlat(self, p: Point) -> Point {
        match self {
            Crs::Epsg4326 => p,
            Crs::Epsg3857 => lonlat_to_mercator(p),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Crs {
    type Err = String;

    /// Accepts `EPSG:xxxx`, the OGC URN form, and the common aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let code = upper.rsplit(':').next().unwrap_or("");
        match code {
            "4326" | "CRS84" | "WGS84" => Ok(Crs::Epsg4326),
            "3857" | "900913" | "102100" => Ok(Crs::Epsg3857),
            _ => Err(format!("Unsupported CRS: {}", s)),
        }
    }
}

pub fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
}

/// lon/lat degrees to Web Mercator meters.
pub fn lonlat_to_mercator(p: Point) -> Point {
    let lat = clamp_latitude(p.y).to_radians();
    Point::new(
        EARTH_RADIUS * p.x.to_radians(),
        EARTH_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln(),
    )
}

/// Web Mercator meters to lon/lat degrees.
pub fn mercator_to_lonlat(p: Point) -> Point {
    Point::new(
        (p.x / EARTH_RADIUS).to_degrees(),
        (2.0 * (p.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
    )
}

/// lon/lat to normalized world coordinates: `[0, 1]` on both axes,
/// origin at the north-west corner (tile pyramid convention).
pub fn lonlat_to_unit(p: Point) -> Point {
    let m = lonlat_to_mercator(p);
    Point::new(
        (m.x + HALF_WORLD_METERS) / (2.0 * HALF_WORLD_METERS),
        (HALF_WORLD_METERS - m.y) / (2.0 * HALF_WORLD_METERS),
    )
}

/// Inverse of [`lonlat_to_unit`]. `x` outside `[0, 1]` maps to longitudes
/// beyond ±180, which callers may wrap.
pub fn unit_to_lonlat(u: Point) -> Point {
    mercator_to_lonlat(Point::new(
        u.x * 2.0 * HALF_WORLD_METERS - HALF_WORLD_METERS,
        HALF_WORLD_METERS - u.y * 2.0 * HALF_WORLD_METERS,
    ))
}

/// Wrap a longitude into `[-180, 180)`.
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point, eps: f64) {
        assert!((a.x - b.x).abs() < eps, "{:?} != {:?}", a, b);
        assert!((a.y - b.y).abs() < eps, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_mercator_known_values() {
        assert_close(lonlat_to_mercator(Point::ZERO), Point::ZERO, 1e-9);
        let edge = lonlat_to_mercator(Point::new(180.0, MAX_LATITUDE));
        assert_close(edge, Point::new(HALF_WORLD_METERS, HALF_WORLD_METERS), 1e-2);
    }

    #[test]
    fn test_mercator_roundtrip() {
        let india = Point::new(78.9629, 20.5937);
        let back = mercator_to_lonlat(lonlat_to_mercator(india));
        assert_close(back, india, 1e-9);
    }

    #[test]
    fn test_latitude_is_clamped() {
        let pole = lonlat_to_mercator(Point::new(0.0, 90.0));
        assert!(pole.y.is_finite());
        assert!((mercator_to_lonlat(pole).y - MAX_LATITUDE).abs() < 1e-6);
    }

    #[test]
    fn test_unit_space() {
        assert_close(lonlat_to_unit(Point::ZERO), Point::new(0.5, 0.5), 1e-12);
        assert_close(
            lonlat_to_unit(Point::new(-180.0, MAX_LATITUDE)),
            Point::new(0.0, 0.0),
            1e-9,
        );
        let p = Point::new(-73.98, 40.75);
        assert_close(unit_to_lonlat(lonlat_to_unit(p)), p, 1e-9);
    }

    #[test]
    fn test_crs_parse() {
        assert_eq!("EPSG:3857".parse::<Crs>(), Ok(Crs::Epsg3857));
        assert_eq!("urn:ogc:def:crs:EPSG::3857".parse::<Crs>(), Ok(Crs::Epsg3857));
        assert_eq!("urn:ogc:def:crs:OGC:1.3:CRS84".parse::<Crs>(), Ok(Crs::Epsg4326));
        assert!("EPSG:2154".parse::<Crs>().is_err());
    }

    #[test]
    fn test_wrap_longitude() {
        assert!((wrap_longitude(190.0) + 170.0).abs() < 1e-12);
        assert!((wrap_longitude(-190.0) - 170.0).abs() < 1e-12);
        assert!((wrap_longitude(45.0) - 45.0).abs() < 1e-12);
    }
}
