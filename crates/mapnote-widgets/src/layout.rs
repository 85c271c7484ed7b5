//! Small layout pieces shared by the overlays.

use egui::{RichText, Stroke, Ui};

use crate::theme;

/// Short vertical rule between toolbar groups.
pub fn vertical_separator(ui: &mut Ui) {
    let rect = ui.available_rect_before_wrap();
    let half = 7.0;
    ui.painter().vline(
        rect.left() + 1.0,
        (rect.center().y - half)..=(rect.center().y + half),
        Stroke::new(1.0, theme::DIVIDER),
    );
    ui.add_space(3.0);
}

/// Small muted caption for a group of controls.
pub fn section_label(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(10.0).color(theme::TEXT_MUTED));
}

/// One line of a shortcut listing: the key chord, then what it does.
pub fn shortcut_row(ui: &mut Ui, keys: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [56.0, 16.0],
            egui::Label::new(RichText::new(keys).monospace().size(11.0).color(theme::ACCENT)),
        );
        ui.label(RichText::new(description).size(11.0).color(theme::TEXT));
    });
}
