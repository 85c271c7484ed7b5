//! Button components: toggles, segmented selectors, text buttons and the
//! per-feature delete button.

use egui::{
    Align2, Color32, CornerRadius, CursorIcon, FontId, Pos2, Response, Sense, Stroke, Ui, vec2,
};

use crate::{sizing, theme};

/// A text toggle button that shows selected/unselected state.
pub struct ToggleButton<'a> {
    label: &'a str,
    selected: bool,
    min_width: Option<f32>,
    height: f32,
    font_size: f32,
    tooltip: Option<&'a str>,
}

impl<'a> ToggleButton<'a> {
    /// A toggle labelled `label`, drawn filled while `selected`.
    pub fn new(label: &'a str, selected: bool) -> Self {
        Self {
            label,
            selected,
            min_width: None,
            height: 24.0,
            font_size: 11.0,
            tooltip: None,
        }
    }

    /// Text shown on hover.
    pub fn tooltip(mut self, text: &'a str) -> Self {
        self.tooltip = Some(text);
        self
    }

    /// Set minimum width.
    pub fn min_width(mut self, width: f32) -> Self {
        self.min_width = Some(width);
        self
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// Set the font size.
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    /// Show the button and return true if clicked.
    pub fn show(self, ui: &mut Ui) -> bool {
        let font_id = FontId::proportional(self.font_size);
        let galley = ui
            .painter()
            .layout_no_wrap(self.label.to_string(), font_id.clone(), Color32::PLACEHOLDER);
        let text_width = galley.size().x + 16.0;
        let width = self.min_width.map_or(text_width, |w| w.max(text_width));

        let (rect, response) = ui.allocate_exact_size(vec2(width, self.height), Sense::click());

        if ui.is_rect_visible(rect) {
            let bg_color = if self.selected {
                theme::ACCENT
            } else if response.hovered() {
                Color32::from_gray(235)
            } else {
                Color32::from_gray(245)
            };
            let text_color = if self.selected {
                Color32::WHITE
            } else {
                Color32::from_gray(80)
            };

            ui.painter()
                .rect_filled(rect, CornerRadius::same(sizing::CORNER_RADIUS), bg_color);
            ui.painter().text(
                rect.center(),
                Align2::CENTER_CENTER,
                self.label,
                font_id,
                text_color,
            );
        }

        let clicked = response.clicked();
        let response = response.on_hover_cursor(CursorIcon::PointingHand);
        if let Some(text) = self.tooltip {
            response.on_hover_text(text);
        }
        clicked
    }
}

/// A row of mutually exclusive toggle buttons.
///
/// Each option may carry a shortcut hint shown as a tooltip.
pub struct SegmentedSelector<'a> {
    options: &'a [(&'a str, &'a str)],
    selected: usize,
    min_width: f32,
}

impl<'a> SegmentedSelector<'a> {
    /// `options` are `(label, shortcut)` pairs; `selected` indexes into them.
    pub fn new(options: &'a [(&'a str, &'a str)], selected: usize) -> Self {
        Self {
            options,
            selected,
            min_width: 64.0,
        }
    }

    pub fn min_width(mut self, width: f32) -> Self {
        self.min_width = width;
        self
    }

    /// Show the selector. Returns the newly chosen index, if it changed.
    pub fn show(self, ui: &mut Ui) -> Option<usize> {
        let mut chosen = None;
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 2.0;
            for (index, (label, shortcut)) in self.options.iter().enumerate() {
                let selected = index == self.selected;
                let mut button = ToggleButton::new(label, selected)
                    .min_width(self.min_width)
                    .height(sizing::MEDIUM)
                    .font_size(12.0);
                if !shortcut.is_empty() {
                    button = button.tooltip(shortcut);
                }
                let clicked = button.show(ui);
                if clicked && !selected {
                    chosen = Some(index);
                }
            }
        });
        chosen
    }
}

/// A flat text button with an optional shortcut hint.
pub struct TextButton<'a> {
    label: &'a str,
    shortcut: Option<&'a str>,
}

impl<'a> TextButton<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            shortcut: None,
        }
    }

    /// Add a shortcut hint.
    pub fn shortcut(mut self, shortcut: &'a str) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    /// Show the button and return true if clicked.
    pub fn show(self, ui: &mut Ui) -> bool {
        let (rect, response) = ui.allocate_at_least(vec2(0.0, 24.0), Sense::click());

        if ui.is_rect_visible(rect) {
            let bg_color = if response.hovered() {
                theme::HOVER_BG
            } else {
                Color32::TRANSPARENT
            };
            ui.painter()
                .rect_filled(rect, CornerRadius::same(sizing::CORNER_RADIUS), bg_color);
            ui.painter().text(
                Pos2::new(rect.left() + 8.0, rect.center().y),
                Align2::LEFT_CENTER,
                self.label,
                FontId::proportional(12.0),
                theme::TEXT,
            );
            if let Some(shortcut) = self.shortcut {
                ui.painter().text(
                    Pos2::new(rect.right() - 8.0, rect.center().y),
                    Align2::RIGHT_CENTER,
                    shortcut,
                    FontId::proportional(11.0),
                    theme::TEXT_MUTED,
                );
            }
        }

        let clicked = response.clicked();
        response.on_hover_cursor(CursorIcon::PointingHand);
        clicked
    }
}

/// Round red "X" button anchored next to a feature.
pub struct DeleteButton {
    size: f32,
    tooltip: Option<String>,
}

impl Default for DeleteButton {
    fn default() -> Self {
        Self::new()
    }
}

impl DeleteButton {
    pub fn new() -> Self {
        Self {
            size: sizing::DELETE,
            tooltip: None,
        }
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn tooltip(mut self, text: impl Into<String>) -> Self {
        self.tooltip = Some(text.into());
        self
    }

    /// Paint the button into the current ui. Returns the response so callers
    /// can check `clicked()`.
    pub fn show(self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(vec2(self.size, self.size), Sense::click());

        if ui.is_rect_visible(rect) {
            let fill = if response.hovered() {
                theme::DANGER_HOVER
            } else {
                theme::DANGER
            };
            let radius = self.size / 2.0;
            ui.painter().circle(
                rect.center(),
                radius,
                fill,
                Stroke::new(1.5, Color32::WHITE),
            );

            let arm = radius * 0.4;
            let c = rect.center();
            let stroke = Stroke::new(2.0, Color32::WHITE);
            ui.painter()
                .line_segment([c + vec2(-arm, -arm), c + vec2(arm, arm)], stroke);
            ui.painter()
                .line_segment([c + vec2(-arm, arm), c + vec2(arm, -arm)], stroke);
        }

        let response = response.on_hover_cursor(CursorIcon::PointingHand);
        match self.tooltip {
            Some(text) => response.on_hover_text(text),
            None => response,
        }
    }
}
