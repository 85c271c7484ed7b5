//! Interactions attached to the map: the draw tool and the modify tool.

mod draw;
mod modify;

pub use draw::{DrawTool, Sketch};
pub use modify::{ModifyHit, ModifyTool};

use crate::geometry::GeometryKind;

/// An attached interaction.
#[derive(Debug, Clone)]
pub enum Interaction {
    Draw(DrawTool),
    Modify(ModifyTool),
}

/// The interactions currently attached to the map.
#[derive(Debug, Clone, Default)]
pub struct Interactions {
    attached: Vec<Interaction>,
}

impl Interactions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an interaction.
    pub fn attach(&mut self, interaction: Interaction) {
        self.attached.push(interaction);
    }

    /// Detach every draw tool, discarding any sketch.
    pub fn detach_draw(&mut self) {
        self.attached.retain(|i| !matches!(i, Interaction::Draw(_)));
    }

    /// Detach every modify tool.
    pub fn detach_modify(&mut self) {
        self.attached.retain(|i| !matches!(i, Interaction::Modify(_)));
    }

    /// Replace the tool pair: afterwards exactly one draw tool for `kind`
    /// and one modify tool are attached.
    pub fn set_geometry_kind(&mut self, kind: GeometryKind) {
        self.detach_draw();
        self.detach_modify();
        self.attach(Interaction::Draw(DrawTool::new(kind)));
        self.attach(Interaction::Modify(ModifyTool::new()));
    }

    pub fn draw_count(&self) -> usize {
        self.attached
            .iter()
            .filter(|i| matches!(i, Interaction::Draw(_)))
            .count()
    }

    pub fn modify_count(&self) -> usize {
        self.attached
            .iter()
            .filter(|i| matches!(i, Interaction::Modify(_)))
            .count()
    }

    pub fn draw(&self) -> Option<&DrawTool> {
        self.attached.iter().find_map(|i| match i {
            Interaction::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn draw_mut(&mut self) -> Option<&mut DrawTool> {
        self.attached.iter_mut().find_map(|i| match i {
            Interaction::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn modify(&self) -> Option<&ModifyTool> {
        self.attached.iter().find_map(|i| match i {
            Interaction::Modify(m) => Some(m),
            _ => None,
        })
    }

    pub fn modify_mut(&mut self) -> Option<&mut ModifyTool> {
        self.attached.iter_mut().find_map(|i| match i {
            Interaction::Modify(m) => Some(m),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_geometry_kind_attaches_one_pair() {
        let mut interactions = Interactions::new();
        assert_eq!(interactions.draw_count(), 0);

        for kind in [
            GeometryKind::Point,
            GeometryKind::Polygon,
            GeometryKind::Polygon,
            GeometryKind::LineString,
        ] {
            interactions.set_geometry_kind(kind);
            assert_eq!(interactions.draw_count(), 1);
            assert_eq!(interactions.modify_count(), 1);
            assert_eq!(interactions.draw().map(DrawTool::kind), Some(kind));
        }
    }

    #[test]
    fn test_switch_discards_sketch() {
        let mut interactions = Interactions::new();
        interactions.set_geometry_kind(GeometryKind::LineString);
        interactions
            .draw_mut()
            .unwrap()
            .hover(kurbo::Point::new(1.0, 1.0));
        interactions.set_geometry_kind(GeometryKind::Polygon);
        assert!(interactions.draw().unwrap().sketch().is_none());
    }

    #[test]
    fn test_detach() {
        let mut interactions = Interactions::new();
        interactions.set_geometry_kind(GeometryKind::Point);
        interactions.detach_draw();
        assert_eq!(interactions.draw_count(), 0);
        assert_eq!(interactions.modify_count(), 1);
        interactions.detach_modify();
        assert!(interactions.modify().is_none());
    }
}
