//! UI components using egui.

use egui::{Align2, Context, Id, Pos2, Rect, RichText, Vec2};
use mapnote_core::{FeatureId, GeometryKind};
use mapnote_widgets::{
    DeleteButton, FrameStyle, MenuItem, SegmentedSelector, TextButton, ToggleButton,
    menu_separator, overlay_frame, section_label, shortcut_row, sizing, theme,
    vertical_separator,
};

use crate::shortcuts::ShortcutRegistry;

/// Persistent UI state.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Is the file menu open?
    pub menu_open: bool,
    /// Is the shortcuts panel open?
    pub shortcuts_open: bool,
    /// Last message shown in the status line.
    pub status: Option<String>,
}

/// Per-frame snapshot of the map the UI draws over.
#[derive(Debug, Clone)]
pub struct MapOverlay {
    pub kind: GeometryKind,
    /// Delete control anchors in logical screen pixels.
    pub controls: Vec<(FeatureId, Pos2)>,
    pub feature_count: usize,
    pub drawing: bool,
    pub attribution: String,
}

/// Actions triggered by UI interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    SetGeometryKind(GeometryKind),
    DeleteFeature(FeatureId),
    FinishDrawing,
    UndoVertex,
    AbortDrawing,
    FitToFeatures,
    ExportGeoJson,
    ImportGeoJson,
    ClearAll,
}

/// Draw every overlay and return the action the user triggered, if any.
pub fn render_ui(ctx: &Context, ui_state: &mut UiState, overlay: &MapOverlay) -> Option<UiAction> {
    let toolbar_action = render_toolbar(ctx, overlay);
    let delete_action = render_delete_buttons(ctx, overlay);
    let menu_action = render_file_menu(ctx, ui_state, overlay);
    render_shortcuts_panel(ctx, ui_state);
    render_status_bar(ctx, ui_state, overlay);

    toolbar_action.or(delete_action).or(menu_action)
}

/// Geometry type selector, plus finish/cancel while a sketch is open.
fn render_toolbar(ctx: &Context, overlay: &MapOverlay) -> Option<UiAction> {
    let mut action = None;
    let options: Vec<(&str, &str)> = GeometryKind::ALL
        .iter()
        .map(|&kind| (kind.label(), ShortcutRegistry::kind_hint(kind)))
        .collect();
    let selected = GeometryKind::ALL
        .iter()
        .position(|&k| k == overlay.kind)
        .unwrap_or(0);

    egui::Area::new(Id::new("geometry_toolbar"))
        .anchor(Align2::CENTER_TOP, Vec2::new(0.0, 12.0))
        .show(ctx, |ui| {
            overlay_frame(FrameStyle::Toolbar).show(ui, |ui| {
                ui.horizontal(|ui| {
                    section_label(ui, "Geometry type");
                    ui.add_space(6.0);
                    if let Some(index) = SegmentedSelector::new(&options, selected).show(ui) {
                        action = GeometryKind::ALL.get(index).copied().map(UiAction::SetGeometryKind);
                    }

                    if overlay.drawing {
                        ui.add_space(6.0);
                        vertical_separator(ui);
                        ui.add_space(6.0);
                        if TextButton::new("Finish").shortcut("Enter").show(ui) {
                            action = Some(UiAction::FinishDrawing);
                        }
                        if TextButton::new("Cancel").shortcut("Esc").show(ui) {
                            action = Some(UiAction::AbortDrawing);
                        }
                    }
                });
            });
        });

    action
}

/// Where the delete button for an anchor sits: centered on it.
fn delete_button_rect(anchor: Pos2) -> Rect {
    Rect::from_center_size(anchor, Vec2::splat(sizing::DELETE))
}

/// One round delete button per feature, centered on its first coordinate.
fn render_delete_buttons(ctx: &Context, overlay: &MapOverlay) -> Option<UiAction> {
    let mut action = None;

    for &(id, anchor) in &overlay.controls {
        egui::Area::new(Id::new(("delete_control", id)))
            .fixed_pos(delete_button_rect(anchor).min)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                if DeleteButton::new().tooltip("Delete feature").show(ui).clicked() {
                    action = Some(UiAction::DeleteFeature(id));
                }
            });
    }

    action
}

fn render_file_menu(ctx: &Context, ui_state: &mut UiState, overlay: &MapOverlay) -> Option<UiAction> {
    let mut action = None;
    let has_features = overlay.feature_count > 0;

    egui::Area::new(Id::new("menu_button"))
        .anchor(Align2::LEFT_TOP, Vec2::new(12.0, 12.0))
        .show(ctx, |ui| {
            overlay_frame(FrameStyle::Panel).show(ui, |ui| {
                if ToggleButton::new("Menu", ui_state.menu_open)
                    .height(sizing::MEDIUM)
                    .font_size(12.0)
                    .show(ui)
                {
                    ui_state.menu_open = !ui_state.menu_open;
                }
            });
        });

    if !ui_state.menu_open {
        return None;
    }

    egui::Area::new(Id::new("file_menu_dropdown"))
        .anchor(Align2::LEFT_TOP, Vec2::new(12.0, 60.0))
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            overlay_frame(FrameStyle::Panel).show(ui, |ui| {
                ui.set_width(sizing::MENU_WIDTH);
                ui.vertical(|ui| {
                    ui.spacing_mut().item_spacing = Vec2::new(0.0, 2.0);

                    if MenuItem::new("Export GeoJSON")
                        .shortcut("Ctrl+E")
                        .enabled(has_features)
                        .show(ui)
                    {
                        action = Some(UiAction::ExportGeoJson);
                    }
                    if MenuItem::new("Import GeoJSON").shortcut("Ctrl+O").show(ui) {
                        action = Some(UiAction::ImportGeoJson);
                    }

                    menu_separator(ui);

                    if MenuItem::new("Zoom to features")
                        .shortcut("F")
                        .enabled(has_features)
                        .show(ui)
                    {
                        action = Some(UiAction::FitToFeatures);
                    }
                    if MenuItem::new("Clear all").enabled(has_features).show(ui) {
                        action = Some(UiAction::ClearAll);
                    }

                    menu_separator(ui);

                    if MenuItem::new("Keyboard shortcuts").show(ui) {
                        ui_state.shortcuts_open = !ui_state.shortcuts_open;
                        ui_state.menu_open = false;
                    }
                });
            });
        });

    if action.is_some() {
        ui_state.menu_open = false;
    }
    action
}

fn render_shortcuts_panel(ctx: &Context, ui_state: &mut UiState) {
    if !ui_state.shortcuts_open {
        return;
    }

    egui::Area::new(Id::new("shortcuts_panel"))
        .anchor(Align2::RIGHT_TOP, Vec2::new(-12.0, 12.0))
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            overlay_frame(FrameStyle::Panel).show(ui, |ui| {
                ui.set_width(240.0);
                ui.horizontal(|ui| {
                    section_label(ui, "Keyboard shortcuts");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if TextButton::new("Close").show(ui) {
                            ui_state.shortcuts_open = false;
                        }
                    });
                });
                for shortcut in ShortcutRegistry::all() {
                    shortcut_row(ui, &shortcut.format(), shortcut.description);
                }
            });
        });
}

/// Feature count, last status message and the tile attribution.
fn render_status_bar(ctx: &Context, ui_state: &UiState, overlay: &MapOverlay) {
    egui::Area::new(Id::new("status_bar"))
        .anchor(Align2::RIGHT_BOTTOM, Vec2::new(-4.0, -4.0))
        .interactable(false)
        .show(ctx, |ui| {
            overlay_frame(FrameStyle::StatusBar).show(ui, |ui| {
                ui.horizontal(|ui| {
                    let features = match overlay.feature_count {
                        1 => "1 feature".to_string(),
                        n => format!("{} features", n),
                    };
                    ui.label(RichText::new(features).size(10.0).color(theme::TEXT_MUTED));
                    if let Some(status) = &ui_state.status {
                        ui.label(RichText::new(status).size(10.0).color(theme::TEXT));
                    }
                    ui.label(RichText::new(&overlay.attribution).size(10.0).color(theme::TEXT_MUTED));
                });
            });
        });
}
