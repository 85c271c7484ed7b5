//! Keyboard shortcuts: the command table and its documentation.

use mapnote_core::GeometryKind;
use winit::keyboard::{Key, NamedKey};

use crate::ui::UiAction;

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+E").
    pub fn format(&self) -> String {
        if self.ctrl {
            format!("Ctrl+{}", self.key)
        } else {
            self.key.to_string()
        }
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("1", false, "Draw points"),
            Shortcut::new("2", false, "Draw lines"),
            Shortcut::new("3", false, "Draw polygons"),
            Shortcut::new("Enter", false, "Finish the current drawing"),
            Shortcut::new("Backspace", false, "Remove the last placed vertex"),
            Shortcut::new("Escape", false, "Abort the current drawing"),
            Shortcut::new("F", false, "Zoom to all features"),
            Shortcut::new("E", true, "Export GeoJSON"),
            Shortcut::new("O", true, "Import GeoJSON"),
        ]
    }

    /// Shortcut hint for a geometry kind, as shown on the selector.
    pub fn kind_hint(kind: GeometryKind) -> &'static str {
        match kind {
            GeometryKind::Point => "1",
            GeometryKind::LineString => "2",
            GeometryKind::Polygon => "3",
        }
    }
}

/// Map a pressed key to the action it triggers.
pub fn command_for_key(key: &Key, ctrl: bool) -> Option<UiAction> {
    match key {
        Key::Named(NamedKey::Enter) => Some(UiAction::FinishDrawing),
        Key::Named(NamedKey::Backspace) => Some(UiAction::UndoVertex),
        Key::Named(NamedKey::Escape) => Some(UiAction::AbortDrawing),
        Key::Character(c) if ctrl => match c.to_lowercase().as_str() {
            "e" => Some(UiAction::ExportGeoJson),
            "o" => Some(UiAction::ImportGeoJson),
            _ => None,
        },
        Key::Character(c) => match c.as_str() {
            "1" => Some(UiAction::SetGeometryKind(GeometryKind::Point)),
            "2" => Some(UiAction::SetGeometryKind(GeometryKind::LineString)),
            "3" => Some(UiAction::SetGeometryKind(GeometryKind::Polygon)),
            "f" | "F" => Some(UiAction::FitToFeatures),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(c: &str) -> Key {
        Key::Character(c.into())
    }

    #[test]
    fn test_digit_keys_select_kinds() {
        assert_eq!(
            command_for_key(&character("1"), false),
            Some(UiAction::SetGeometryKind(GeometryKind::Point))
        );
        assert_eq!(
            command_for_key(&character("3"), false),
            Some(UiAction::SetGeometryKind(GeometryKind::Polygon))
        );
        assert_eq!(command_for_key(&character("4"), false), None);
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(
            command_for_key(&Key::Named(NamedKey::Enter), false),
            Some(UiAction::FinishDrawing)
        );
        assert_eq!(
            command_for_key(&Key::Named(NamedKey::Escape), true),
            Some(UiAction::AbortDrawing)
        );
        assert_eq!(
            command_for_key(&Key::Named(NamedKey::Backspace), false),
            Some(UiAction::UndoVertex)
        );
        assert!(ShortcutRegistry::all().iter().any(|s| s.key == "Backspace"));
    }

    #[test]
    fn test_ctrl_combinations() {
        assert_eq!(command_for_key(&character("E"), true), Some(UiAction::ExportGeoJson));
        assert_eq!(command_for_key(&character("o"), true), Some(UiAction::ImportGeoJson));
        assert_eq!(command_for_key(&character("1"), true), None);
    }

    #[test]
    fn test_registry_hints_match_keys() {
        for kind in GeometryKind::ALL {
            let hint = ShortcutRegistry::kind_hint(kind);
            assert_eq!(
                command_for_key(&character(hint), false),
                Some(UiAction::SetGeometryKind(kind))
            );
            assert!(ShortcutRegistry::all().iter().any(|s| s.key == hint));
        }
        assert_eq!(Shortcut::new("E", true, "").format(), "Ctrl+E");
    }
}
