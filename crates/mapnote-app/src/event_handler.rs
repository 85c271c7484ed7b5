//! Translation of winit window events into map pointer events.

use kurbo::{Point, Vec2};
use mapnote_core::{ClickTracker, MouseButton, PointerEvent};
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitButton, MouseScrollDelta};

/// Pixel-delta scroll (trackpads) per wheel notch.
const PIXELS_PER_NOTCH: f64 = 50.0;

/// Tracks the cursor and button state between winit events.
#[derive(Debug, Default)]
pub struct EventHandler {
    /// Last cursor position in logical pixels.
    cursor: Point,
    /// Button pressed while over the map (not over egui).
    map_press: Option<MouseButton>,
    clicks: ClickTracker,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    /// True while a press that started on the map is held.
    pub fn is_map_pressed(&self) -> bool {
        self.map_press.is_some()
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>, scale_factor: f64) -> PointerEvent {
        self.cursor = to_logical(position, scale_factor);
        PointerEvent::Move {
            position: self.cursor,
        }
    }

    /// Translate a button press or release.
    ///
    /// `was_panning` tells whether the session turned this press into a pan,
    /// in which case the release never counts toward a double-click.
    pub fn mouse_input(
        &mut self,
        state: ElementState,
        button: WinitButton,
        was_panning: bool,
    ) -> Vec<PointerEvent> {
        let Some(button) = map_button(button) else {
            return Vec::new();
        };
        let position = self.cursor;

        match state {
            ElementState::Pressed => {
                self.map_press = Some(button);
                vec![PointerEvent::Down { position, button }]
            }
            ElementState::Released => {
                if self.map_press == Some(button) {
                    self.map_press = None;
                }
                let mut events = vec![PointerEvent::Up { position, button }];
                if button == MouseButton::Left {
                    if was_panning {
                        self.clicks.reset();
                    } else if self.clicks.register(position) {
                        events.push(PointerEvent::DoubleClick { position });
                    }
                }
                events
            }
        }
    }

    pub fn mouse_wheel(&self, delta: MouseScrollDelta) -> PointerEvent {
        PointerEvent::Scroll {
            position: self.cursor,
            delta: scroll_notches(delta),
        }
    }

    /// Forget a press whose release will never arrive.
    pub fn release_all(&mut self) {
        self.map_press = None;
    }
}

pub fn to_logical(position: PhysicalPosition<f64>, scale_factor: f64) -> Point {
    let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
    Point::new(position.x / scale, position.y / scale)
}

pub fn map_button(button: WinitButton) -> Option<MouseButton> {
    match button {
        WinitButton::Left => Some(MouseButton::Left),
        WinitButton::Right => Some(MouseButton::Right),
        WinitButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

/// Normalize wheel input to notches; positive `y` zooms in.
pub fn scroll_notches(delta: MouseScrollDelta) -> Vec2 {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => Vec2::new(x as f64, y as f64),
        MouseScrollDelta::PixelDelta(pos) => {
            Vec2::new(pos.x / PIXELS_PER_NOTCH, pos.y / PIXELS_PER_NOTCH)
        }
    }
}
