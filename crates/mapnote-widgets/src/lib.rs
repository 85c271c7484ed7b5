//! egui widgets for the MapNote overlays: the geometry type selector, the
//! per-feature delete button, the file menu and the frames they sit in.

pub mod buttons;
pub mod layout;
pub mod menu;

pub use buttons::{DeleteButton, SegmentedSelector, TextButton, ToggleButton};
pub use layout::{section_label, shortcut_row, vertical_separator};
pub use menu::{FrameStyle, MenuItem, menu_separator, overlay_frame};

pub mod sizing {
    /// Toolbar button and menu row height.
    pub const MEDIUM: f32 = 28.0;
    /// Delete button diameter.
    pub const DELETE: f32 = 25.0;
    /// Dropdown menu width.
    pub const MENU_WIDTH: f32 = 200.0;
    pub const CORNER_RADIUS: u8 = 4;
    pub const PANEL_RADIUS: u8 = 8;
}

pub mod theme {
    use egui::Color32;

    pub const TEXT: Color32 = Color32::from_rgb(55, 60, 66);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(118, 124, 130);
    pub const DISABLED: Color32 = Color32::from_rgb(185, 188, 192);
    pub const BORDER: Color32 = Color32::from_rgb(214, 218, 222);
    pub const DIVIDER: Color32 = Color32::from_rgb(228, 231, 234);
    /// Matches the blue feature stroke.
    pub const ACCENT: Color32 = Color32::from_rgb(0, 0, 255);
    pub const HOVER_BG: Color32 = Color32::from_rgb(240, 243, 248);
    pub const PANEL_BG: Color32 = Color32::from_rgba_premultiplied(250, 250, 252, 250);
    pub const STATUS_BG: Color32 = Color32::from_rgba_premultiplied(200, 200, 200, 200);
    pub const DANGER: Color32 = Color32::from_rgb(220, 38, 38);
    pub const DANGER_HOVER: Color32 = Color32::from_rgb(185, 28, 28);
}
