//! GeoJSON encoding and decoding of the feature collection.
//!
//! Output is deterministic: fields are written in a fixed order and
//! properties are sorted by key, so encoding the same collection twice
//! yields identical text.

use crate::collection::FeatureCollection;
use crate::feature::{Feature, FeatureId};
use crate::geometry::Geometry;
use crate::projection::Crs;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// GeoJSON errors.
#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unexpected GeoJSON type: {0}")]
    UnexpectedType(String),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

type Position = [f64; 2];

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum WireGeometry {
    Point { coordinates: Vec<f64> },
    LineString { coordinates: Vec<Vec<f64>> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum WireGeometryOut {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
}

/// Legacy GeoJSON 2008 named CRS member.
#[derive(Debug, Serialize, Deserialize)]
struct WireCrs {
    #[serde(rename = "type")]
    kind: String,
    properties: WireCrsProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireCrsProperties {
    name: String,
}

#[derive(Serialize)]
struct WireFeatureOut<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: String,
    geometry: WireGeometryOut,
    properties: &'a Map<String, Value>,
}

#[derive(Serialize)]
struct WireCollectionOut<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    crs: Option<WireCrs>,
    features: Vec<WireFeatureOut<'a>>,
}

/// Encode `collection` as a compact GeoJSON FeatureCollection in frame `crs`.
pub fn encode(collection: &FeatureCollection, crs: Crs) -> Result<String, GeoJsonError> {
    Ok(serde_json::to_string(&wire_collection(collection, crs))?)
}

/// Encode `collection` as indented GeoJSON, for export.
pub fn encode_pretty(collection: &FeatureCollection, crs: Crs) -> Result<String, GeoJsonError> {
    Ok(serde_json::to_string_pretty(&wire_collection(collection, crs))?)
}

fn wire_collection(collection: &FeatureCollection, crs: Crs) -> WireCollectionOut<'_> {
    let crs_member = match crs {
        Crs::Epsg4326 => None,
        other => Some(WireCrs {
            kind: "name".to_string(),
            properties: WireCrsProperties {
                name: other.code().to_string(),
            },
        }),
    };

    WireCollectionOut {
        kind: "FeatureCollection",
        crs: crs_member,
        features: collection
            .ordered()
            .map(|f| WireFeatureOut {
                kind: "Feature",
                id: f.id.to_string(),
                geometry: wire_geometry(&f.geometry, crs),
                properties: &f.properties,
            })
            .collect(),
    }
}

fn wire_geometry(geometry: &Geometry, crs: Crs) -> WireGeometryOut {
    let pos = |p: &Point| {
        let q = crs.from_lonlat(*p);
        [q.x, q.y]
    };
    match geometry {
        Geometry::Point(p) => WireGeometryOut::Point { coordinates: pos(p) },
        Geometry::LineString(points) => WireGeometryOut::LineString {
            coordinates: points.iter().map(pos).collect(),
        },
        Geometry::Polygon(rings) => WireGeometryOut::Polygon {
            coordinates: rings
                .iter()
                .map(|ring| {
                    let mut closed: Vec<Position> = ring.iter().map(pos).collect();
                    if let Some(first) = closed.first().copied() {
                        closed.push(first);
                    }
                    closed
                })
                .collect(),
        },
    }
}

/// Decode a GeoJSON payload into a collection.
///
/// Accepts a FeatureCollection, a bare Feature or a bare geometry.
/// `default_crs` applies when the payload carries no `crs` member.
/// Features whose geometry is unsupported or invalid are skipped with a
/// warning; only a payload that is not GeoJSON at all is an error.
pub fn decode(text: &str, default_crs: Crs) -> Result<FeatureCollection, GeoJsonError> {
    let root: Value = serde_json::from_str(text)?;
    let obj = root
        .as_object()
        .ok_or_else(|| GeoJsonError::UnexpectedType(json_kind(&root).to_string()))?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeoJsonError::UnexpectedType("missing \"type\"".to_string()))?;
    let crs = payload_crs(obj).unwrap_or(default_crs);

    let mut collection = FeatureCollection::new();
    match kind {
        "FeatureCollection" => {
            let features = obj
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    GeoJsonError::UnexpectedType("FeatureCollection without features".to_string())
                })?;
            let mut seen = HashSet::new();
            for (index, value) in features.iter().enumerate() {
                match decode_feature(value, crs) {
                    Ok(mut feature) => {
                        if !seen.insert(feature.id) {
                            log::warn!(
                                "Duplicate feature id {} at index {}, assigning a new one",
                                feature.id,
                                index
                            );
                            feature.id = Uuid::new_v4();
                            seen.insert(feature.id);
                        }
                        collection.add(feature);
                    }
                    Err(e) => log::warn!("Skipping feature {}: {}", index, e),
                }
            }
        }
        "Feature" => collection.add(decode_feature(&root, crs)?),
        _ => collection.add(Feature::new(decode_geometry(&root, crs)?)),
    }
    Ok(collection)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn payload_crs(obj: &Map<String, Value>) -> Option<Crs> {
    let member = obj.get("crs")?;
    let wire: WireCrs = match serde_json::from_value(member.clone()) {
        Ok(w) => w,
        Err(e) => {
            log::warn!("Ignoring malformed crs member: {}", e);
            return None;
        }
    };
    match wire.properties.name.parse() {
        Ok(crs) => Some(crs),
        Err(e) => {
            log::warn!("{}, assuming default frame", e);
            None
        }
    }
}

fn decode_feature(value: &Value, crs: Crs) -> Result<Feature, GeoJsonError> {
    let obj = value
        .as_object()
        .ok_or_else(|| GeoJsonError::UnexpectedType(json_kind(value).to_string()))?;
    match obj.get("type").and_then(Value::as_str) {
        Some("Feature") => {}
        Some(other) => return Err(GeoJsonError::UnexpectedType(other.to_string())),
        None => return Err(GeoJsonError::UnexpectedType("missing \"type\"".to_string())),
    }

    let geometry = match obj.get("geometry") {
        Some(g) if !g.is_null() => decode_geometry(g, crs)?,
        _ => return Err(GeoJsonError::InvalidGeometry("feature has no geometry".to_string())),
    };

    let properties = match obj.get("properties") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    Ok(Feature {
        id: feature_id(obj.get("id")),
        geometry,
        properties,
    })
}

fn feature_id(value: Option<&Value>) -> FeatureId {
    match value {
        Some(Value::String(s)) => Uuid::parse_str(s).unwrap_or_else(|_| {
            log::debug!("Feature id {:?} is not a UUID, assigning a new one", s);
            Uuid::new_v4()
        }),
        _ => Uuid::new_v4(),
    }
}

fn decode_geometry(value: &Value, crs: Crs) -> Result<Geometry, GeoJsonError> {
    let kind = value.get("type").and_then(Value::as_str).unwrap_or("");
    if !matches!(kind, "Point" | "LineString" | "Polygon") {
        return Err(GeoJsonError::UnexpectedType(kind.to_string()));
    }
    let wire: WireGeometry = serde_json::from_value(value.clone())
        .map_err(|e| GeoJsonError::InvalidGeometry(e.to_string()))?;

    let geometry = match wire {
        WireGeometry::Point { coordinates } => Geometry::Point(position(&coordinates, crs)?),
        WireGeometry::LineString { coordinates } => {
            let points = positions(&coordinates, crs)?;
            if points.len() < 2 {
                return Err(GeoJsonError::InvalidGeometry(
                    "LineString needs at least 2 positions".to_string(),
                ));
            }
            Geometry::LineString(points)
        }
        WireGeometry::Polygon { coordinates } => {
            let mut rings = Vec::with_capacity(coordinates.len());
            for ring in &coordinates {
                let mut points = positions(ring, crs)?;
                if points.len() > 1 && points.first() == points.last() {
                    points.pop();
                }
                if points.len() < 3 {
                    return Err(GeoJsonError::InvalidGeometry(
                        "Polygon ring needs at least 3 distinct positions".to_string(),
                    ));
                }
                rings.push(points);
            }
            if rings.is_empty() {
                return Err(GeoJsonError::InvalidGeometry("Polygon has no rings".to_string()));
            }
            Geometry::Polygon(rings)
        }
    };
    Ok(geometry)
}

fn positions(coords: &[Vec<f64>], crs: Crs) -> Result<Vec<Point>, GeoJsonError> {
    coords.iter().map(|c| position(c, crs)).collect()
}

/// Altitude and any further components are ignored.
fn position(coords: &[f64], crs: Crs) -> Result<Point, GeoJsonError> {
    match coords {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(crs.to_lonlat(Point::new(*x, *y))),
        _ => Err(GeoJsonError::InvalidGeometry(format!(
            "bad position {:?}",
            coords
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryKind;

    fn sample() -> FeatureCollection {
        let mut fc = FeatureCollection::new();
        fc.add(Feature::new(Geometry::Point(Point::new(78.9629, 20.5937))));
        fc.add(Feature::new(Geometry::LineString(vec![
            Point::new(77.0, 28.0),
            Point::new(72.8, 19.0),
        ])));
        let mut poly = Feature::new(Geometry::Polygon(vec![vec![
            Point::new(70.0, 10.0),
            Point::new(80.0, 10.0),
            Point::new(75.0, 20.0),
        ]]));
        poly.properties.insert("name".into(), Value::String("triangle".into()));
        fc.add(poly);
        fc
    }

    fn assert_close(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_roundtrip_4326() {
        let fc = sample();
        let text = encode(&fc, Crs::Epsg4326).unwrap();
        let back = decode(&text, Crs::Epsg4326).unwrap();
        assert_eq!(back.ids(), fc.ids());
        for (a, b) in fc.ordered().zip(back.ordered()) {
            assert_eq!(a.kind(), b.kind());
            assert_eq!(a.properties, b.properties);
            assert_eq!(a.geometry.vertex_count(), b.geometry.vertex_count());
            for ((_, pa), (_, pb)) in a.geometry.vertices().iter().zip(b.geometry.vertices()) {
                assert_close(*pa, pb);
            }
        }
    }

    #[test]
    fn test_roundtrip_3857() {
        let fc = sample();
        let text = encode(&fc, Crs::Epsg3857).unwrap();
        assert!(text.contains("\"crs\""));
        assert!(text.contains("EPSG:3857"));

        // The crs member wins over the caller's default
        let back = decode(&text, Crs::Epsg4326).unwrap();
        assert_eq!(back.len(), 3);
        for (a, b) in fc.ordered().zip(back.ordered()) {
            assert_eq!(a.kind(), b.kind());
            for ((_, pa), (_, pb)) in a.geometry.vertices().iter().zip(b.geometry.vertices()) {
                assert_close(*pa, pb);
            }
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let fc = sample();
        assert_eq!(encode(&fc, Crs::Epsg4326).unwrap(), encode(&fc, Crs::Epsg4326).unwrap());
    }

    #[test]
    fn test_polygon_rings_closed_on_write() {
        let mut fc = FeatureCollection::new();
        fc.add(Feature::new(Geometry::Polygon(vec![vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ]])));
        let value: Value = serde_json::from_str(&encode(&fc, Crs::Epsg4326).unwrap()).unwrap();
        let ring = &value["features"][0]["geometry"]["coordinates"][0];
        assert_eq!(ring.as_array().unwrap().len(), 4);
        assert_eq!(ring[0], ring[3]);
    }

    #[test]
    fn test_decode_skips_unsupported_and_invalid() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "MultiPoint", "coordinates": [[0,0],[1,1]]}, "properties": {}},
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0,0]]}, "properties": {}},
                {"type": "Feature", "geometry": null, "properties": {}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [5, 6, 120]}, "properties": {"a": 1}}
            ]
        }"#;
        let fc = decode(text, Crs::Epsg4326).unwrap();
        assert_eq!(fc.len(), 1);
        let f = fc.ordered().next().unwrap();
        assert_eq!(f.geometry, Geometry::Point(Point::new(5.0, 6.0)));
        assert_eq!(f.properties.get("a"), Some(&Value::from(1)));
    }

    #[test]
    fn test_decode_bare_feature_and_geometry() {
        let feature = r#"{"type":"Feature","id":"not-a-uuid","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]},"properties":null}"#;
        let fc = decode(feature, Crs::Epsg4326).unwrap();
        assert_eq!(fc.len(), 1);
        let f = fc.ordered().next().unwrap();
        assert_eq!(f.kind(), GeometryKind::Polygon);
        assert_eq!(f.geometry.vertex_count(), 3);

        let geometry = r#"{"type":"LineString","coordinates":[[0,0],[2,2]]}"#;
        assert_eq!(decode(geometry, Crs::Epsg4326).unwrap().len(), 1);
    }

    #[test]
    fn test_decode_without_crs_uses_default() {
        let text = r#"{"type":"Point","coordinates":[8790109.8196, 2343497.0684]}"#;
        let fc = decode(text, Crs::Epsg3857).unwrap();
        let p = fc.ordered().next().unwrap().geometry.first_coordinate().unwrap();
        assert!((p.x - 78.9629).abs() < 1e-6, "{:?}", p);
        assert!((p.y - 20.5937).abs() < 1e-6, "{:?}", p);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode("not json", Crs::Epsg4326), Err(GeoJsonError::Json(_))));
        assert!(matches!(decode("[]", Crs::Epsg4326), Err(GeoJsonError::UnexpectedType(_))));
        assert!(matches!(
            decode(r#"{"type":"Topology"}"#, Crs::Epsg4326),
            Err(GeoJsonError::UnexpectedType(_))
        ));
        assert!(matches!(
            decode(r#"{"type":"FeatureCollection"}"#, Crs::Epsg4326),
            Err(GeoJsonError::UnexpectedType(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_are_kept_apart() {
        let id = Uuid::new_v4();
        let text = format!(
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","id":"{id}","geometry":{{"type":"Point","coordinates":[0,0]}},"properties":{{}}}},
                {{"type":"Feature","id":"{id}","geometry":{{"type":"Point","coordinates":[1,1]}},"properties":{{}}}}
            ]}}"#
        );
        let fc = decode(&text, Crs::Epsg4326).unwrap();
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.ids()[0], id);
        assert_ne!(fc.ids()[1], id);
    }
}
