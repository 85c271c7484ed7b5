//! Geometry kinds and vertex-level editing.
//!
//! Coordinates are geographic (`x` = longitude, `y` = latitude, degrees).

use crate::projection::wrap_longitude;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The geometry types a user can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GeometryKind {
    #[default]
    Point,
    LineString,
    Polygon,
}

impl GeometryKind {
    /// All drawable kinds, in selector order.
    pub const ALL: [GeometryKind; 3] = [
        GeometryKind::Point,
        GeometryKind::LineString,
        GeometryKind::Polygon,
    ];

    /// GeoJSON type name.
    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
        }
    }

    /// Short label for the selector.
    pub fn label(self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "Line",
            GeometryKind::Polygon => "Polygon",
        }
    }

    /// Minimum number of vertices a finished geometry of this kind needs.
    pub fn min_vertices(self) -> usize {
        match self {
            GeometryKind::Point => 1,
            GeometryKind::LineString => 2,
            GeometryKind::Polygon => 3,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a geometry type name is not one we can draw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported geometry type: {0}")]
pub struct ParseGeometryKindError(pub String);

impl FromStr for GeometryKind {
    type Err = ParseGeometryKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "point" => Ok(GeometryKind::Point),
            "linestring" | "line" => Ok(GeometryKind::LineString),
            "polygon" => Ok(GeometryKind::Polygon),
            _ => Err(ParseGeometryKindError(s.to_string())),
        }
    }
}

/// Address of a single vertex inside a geometry.
///
/// `ring` is always 0 for points and line strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexRef {
    pub ring: usize,
    pub index: usize,
}

impl VertexRef {
    pub const fn new(ring: usize, index: usize) -> Self {
        Self { ring, index }
    }
}

/// A segment between two consecutive vertices.
///
/// Inserting at `insert_at` places a new vertex between `start` and `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub insert_at: VertexRef,
}

/// A feature geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Point),
    LineString(Vec<Point>),
    /// Rings are stored open; the closing vertex is implied.
    Polygon(Vec<Vec<Point>>),
}

impl Geometry {
    /// Build a geometry of `kind` from drawn vertices.
    /// Returns None when there are too few vertices.
    pub fn from_vertices(kind: GeometryKind, vertices: &[Point]) -> Option<Self> {
        if vertices.len() < kind.min_vertices() {
            return None;
        }
        Some(match kind {
            GeometryKind::Point => Geometry::Point(vertices[0]),
            GeometryKind::LineString => Geometry::LineString(vertices.to_vec()),
            GeometryKind::Polygon => Geometry::Polygon(vec![vertices.to_vec()]),
        })
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    /// The first coordinate, used to anchor per-feature controls.
    pub fn first_coordinate(&self) -> Option<Point> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::LineString(points) => points.first().copied(),
            Geometry::Polygon(rings) => rings.first().and_then(|r| r.first()).copied(),
        }
    }

    /// All vertices with their addresses.
    pub fn vertices(&self) -> Vec<(VertexRef, Point)> {
        match self {
            Geometry::Point(p) => vec![(VertexRef::new(0, 0), *p)],
            Geometry::LineString(points) => points
                .iter()
                .enumerate()
                .map(|(i, p)| (VertexRef::new(0, i), *p))
                .collect(),
            Geometry::Polygon(rings) => rings
                .iter()
                .enumerate()
                .flat_map(|(r, ring)| {
                    ring.iter()
                        .enumerate()
                        .map(move |(i, p)| (VertexRef::new(r, i), *p))
                })
                .collect(),
        }
    }

    /// Number of vertices across all rings.
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::LineString(points) => points.len(),
            Geometry::Polygon(rings) => rings.iter().map(Vec::len).sum(),
        }
    }

    pub fn vertex(&self, at: VertexRef) -> Option<Point> {
        match self {
            Geometry::Point(p) => (at == VertexRef::new(0, 0)).then_some(*p),
            Geometry::LineString(points) if at.ring == 0 => points.get(at.index).copied(),
            Geometry::LineString(_) => None,
            Geometry::Polygon(rings) => rings.get(at.ring)?.get(at.index).copied(),
        }
    }

    /// Move a vertex. Returns false if the address is out of range.
    pub fn set_vertex(&mut self, at: VertexRef, position: Point) -> bool {
        let slot = match self {
            Geometry::Point(p) => (at == VertexRef::new(0, 0)).then_some(p),
            Geometry::LineString(points) if at.ring == 0 => points.get_mut(at.index),
            Geometry::LineString(_) => None,
            Geometry::Polygon(rings) => rings.get_mut(at.ring).and_then(|r| r.get_mut(at.index)),
        };
        match slot {
            Some(p) => {
                *p = position;
                true
            }
            None => false,
        }
    }

    /// Insert a vertex before `at.index`. Points cannot gain vertices.
    pub fn insert_vertex(&mut self, at: VertexRef, position: Point) -> bool {
        let ring = match self {
            Geometry::Point(_) => return false,
            Geometry::LineString(points) if at.ring == 0 => points,
            Geometry::LineString(_) => return false,
            Geometry::Polygon(rings) => match rings.get_mut(at.ring) {
                Some(r) => r,
                None => return false,
            },
        };
        if at.index > ring.len() {
            return false;
        }
        ring.insert(at.index, position);
        true
    }

    /// Segments between consecutive vertices, including each ring's closing edge.
    pub fn segments(&self) -> Vec<Segment> {
        let mut out = Vec::new();
        match self {
            Geometry::Point(_) => {}
            Geometry::LineString(points) => {
                for (i, pair) in points.windows(2).enumerate() {
                    out.push(Segment {
                        start: pair[0],
                        end: pair[1],
                        insert_at: VertexRef::new(0, i + 1),
                    });
                }
            }
            Geometry::Polygon(rings) => {
                for (r, ring) in rings.iter().enumerate() {
                    if ring.len() < 2 {
                        continue;
                    }
                    for (i, pair) in ring.windows(2).enumerate() {
                        out.push(Segment {
                            start: pair[0],
                            end: pair[1],
                            insert_at: VertexRef::new(r, i + 1),
                        });
                    }
                    out.push(Segment {
                        start: ring[ring.len() - 1],
                        end: ring[0],
                        insert_at: VertexRef::new(r, ring.len()),
                    });
                }
            }
        }
        out
    }

    /// Bounding box in degrees.
    pub fn bounds(&self) -> Rect {
        let vertices = self.vertices();
        let mut iter = vertices.iter().map(|(_, p)| *p);
        let Some(first) = iter.next() else {
            return Rect::ZERO;
        };
        iter.fold(Rect::from_points(first, first), |r, p| r.union_pt(p))
    }

    /// Shift every vertex by `delta` degrees.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Geometry::Point(p) => *p += delta,
            Geometry::LineString(points) => points.iter_mut().for_each(|p| *p += delta),
            Geometry::Polygon(rings) => rings
                .iter_mut()
                .flat_map(|r| r.iter_mut())
                .for_each(|p| *p += delta),
        }
    }

    /// Move the whole shape by whole turns of longitude so its first
    /// coordinate lies within `[-180, 180]`. Returns true if it moved.
    pub fn wrap_into_world(&mut self) -> bool {
        let Some(first) = self.first_coordinate() else {
            return false;
        };
        if (-180.0..=180.0).contains(&first.x) {
            return false;
        }
        self.translate(Vec2::new((wrap_longitude(first.x) - first.x).round(), 0.0));
        true
    }

    /// Whether `point` lies inside the polygon (even-odd across rings).
    /// Always false for points and lines.
    pub fn contains(&self, point: Point) -> bool {
        let Geometry::Polygon(rings) = self else {
            return false;
        };
        let mut inside = false;
        for ring in rings {
            let n = ring.len();
            if n < 3 {
                continue;
            }
            let mut j = n - 1;
            for i in 0..n {
                let (a, b) = (ring[i], ring[j]);
                if (a.y > point.y) != (b.y > point.y)
                    && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
                {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }
}

/// Distance from `p` to segment `a`-`b`, and the closest point on it.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> (f64, Point) {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq < f64::EPSILON {
        return ((p - a).hypot(), a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    ((p - closest).hypot(), closest)
}
