//! Dropdown menu entries and the frames the map overlays sit in.

use egui::{
    Align2, Color32, CornerRadius, CursorIcon, FontId, Frame, Margin, Pos2, Sense, Stroke, Ui,
    epaint::Shadow, vec2,
};

use crate::{sizing, theme};

/// One row of a dropdown menu, with an optional right-aligned shortcut hint.
pub struct MenuItem<'a> {
    label: &'a str,
    shortcut: Option<&'a str>,
    enabled: bool,
}

impl<'a> MenuItem<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            shortcut: None,
            enabled: true,
        }
    }

    pub fn shortcut(mut self, shortcut: &'a str) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    /// Disabled items are drawn greyed out and never report a click.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns true when clicked while enabled.
    pub fn show(self, ui: &mut Ui) -> bool {
        let size = vec2(ui.available_width().max(sizing::MENU_WIDTH - 16.0), sizing::MEDIUM);
        let sense = if self.enabled { Sense::click() } else { Sense::hover() };
        let (rect, response) = ui.allocate_exact_size(size, sense);

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            if self.enabled && response.hovered() {
                painter.rect_filled(rect, CornerRadius::same(sizing::CORNER_RADIUS), theme::HOVER_BG);
            }

            let (text_color, hint_color) = if self.enabled {
                (theme::TEXT, theme::TEXT_MUTED)
            } else {
                (theme::DISABLED, theme::DISABLED)
            };
            painter.text(
                Pos2::new(rect.left() + 12.0, rect.center().y),
                Align2::LEFT_CENTER,
                self.label,
                FontId::proportional(13.0),
                text_color,
            );
            if let Some(shortcut) = self.shortcut {
                painter.text(
                    Pos2::new(rect.right() - 12.0, rect.center().y),
                    Align2::RIGHT_CENTER,
                    shortcut,
                    FontId::monospace(11.0),
                    hint_color,
                );
            }
        }

        if !self.enabled {
            return false;
        }
        response.on_hover_cursor(CursorIcon::PointingHand).clicked()
    }
}

/// Thin rule between menu groups.
pub fn menu_separator(ui: &mut Ui) {
    ui.add_space(3.0);
    let rect = ui.available_rect_before_wrap();
    ui.painter().hline(
        (rect.left() + 8.0)..=(rect.right() - 8.0),
        rect.top(),
        Stroke::new(1.0, theme::DIVIDER),
    );
    ui.add_space(4.0);
}

/// Where an overlay frame is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStyle {
    /// Menus and floating panels.
    Panel,
    /// The geometry type bar along the top edge.
    Toolbar,
    /// Translucent strip over the map's bottom corner.
    StatusBar,
}

/// Frame for an overlay floating above the map.
pub fn overlay_frame(style: FrameStyle) -> Frame {
    match style {
        FrameStyle::Panel => floating(8, Margin::same(8)),
        FrameStyle::Toolbar => floating(6, Margin::symmetric(12, 6)),
        FrameStyle::StatusBar => Frame::new()
            .fill(theme::STATUS_BG)
            .corner_radius(CornerRadius::same(sizing::CORNER_RADIUS))
            .inner_margin(Margin::symmetric(6, 2)),
    }
}

fn floating(blur: u8, margin: Margin) -> Frame {
    Frame::new()
        .fill(theme::PANEL_BG)
        .corner_radius(CornerRadius::same(sizing::PANEL_RADIUS))
        .stroke(Stroke::new(1.0, theme::BORDER))
        .shadow(Shadow {
            spread: 0,
            blur,
            offset: [0, 2],
            color: Color32::from_black_alpha(14),
        })
        .inner_margin(margin)
}
