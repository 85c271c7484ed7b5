//! Pointer events and click classification.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

/// Pointer travel (pixels) below which a press-release counts as a click.
pub const CLICK_TOLERANCE: f64 = 4.0;

/// Double-click detection constants.
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event in screen coordinates (logical pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// Emitted after the `Up` of the second click of a double-click.
    DoubleClick {
        position: Point,
    },
    /// `delta` is in wheel notches; positive `y` zooms in.
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::DoubleClick { position }
            | PointerEvent::Scroll { position, .. } => position,
        }
    }
}

/// Detects double-clicks from a stream of left clicks.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last_click: Option<(Instant, Point)>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a click. Returns true if it completes a double-click.
    pub fn register(&mut self, position: Point) -> bool {
        self.register_at(position, Instant::now())
    }

    pub fn register_at(&mut self, position: Point, now: Instant) -> bool {
        if let Some((last_time, last_pos)) = self.last_click {
            let elapsed = now.saturating_duration_since(last_time);
            if elapsed < DOUBLE_CLICK_TIME && (position - last_pos).hypot() < DOUBLE_CLICK_DISTANCE {
                // Reset so a triple click is not a second double-click
                self.last_click = None;
                return true;
            }
        }
        self.last_click = Some((now, position));
        false
    }

    pub fn reset(&mut self) {
        self.last_click = None;
    }
}
