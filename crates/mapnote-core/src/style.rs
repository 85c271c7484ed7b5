//! Static overlay style.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Same color with the alpha replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

pub const BLUE: SerializableColor = SerializableColor::rgb(0, 0, 255);
pub const DELETE_RED: SerializableColor = SerializableColor::rgb(220, 38, 38);

/// How features are drawn. Every feature shares one style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureStyle {
    pub stroke: SerializableColor,
    pub stroke_width: f64,
    /// Polygon interior.
    pub fill: SerializableColor,
    pub point_radius: f64,
    pub point_fill: SerializableColor,
    /// Vertex under the pointer or being dragged.
    pub highlight: SerializableColor,
    /// In-progress drawing.
    pub sketch: SerializableColor,
}

impl Default for FeatureStyle {
    fn default() -> Self {
        Self {
            stroke: BLUE,
            stroke_width: 2.0,
            fill: BLUE.with_alpha(26),
            point_radius: 5.0,
            point_fill: BLUE,
            highlight: SerializableColor::rgb(255, 153, 0),
            sketch: SerializableColor::rgb(51, 153, 204),
        }
    }
}
