//! Hooks to the presentation layer: visual effects, observers and the
//! screen position a harvest popup should appear at.
//!
//! The engine never draws anything. It calls these traits after a state
//! change succeeded; hosts without a UI simply pass nothing.

use crate::catalog::BuildingId;

/// Point in viewport pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Element bounds in viewport pixels, as reported by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Visual effect sink.
pub trait EffectSink {
    /// A building was bought; the UI plays its animation.
    fn building_bought(&mut self, building: BuildingId);

    /// Spawn a short-lived text popup. `is_click` marks player-triggered popups,
    /// which the UI renders larger.
    fn floating_text(&mut self, at: ScreenPoint, text: &str, is_click: bool);
}

/// Callbacks from the frame loop.
pub trait Observer {
    fn on_evolve(&mut self, _rank_index: usize) {}
    fn on_tick(&mut self) {}
}

/// Where a harvest popup goes: the pointer if it carries real coordinates,
/// else the centre of the harvested element, else the viewport centre.
pub fn resolve_anchor(
    pointer: Option<ScreenPoint>,
    element: Option<BoundingBox>,
    viewport: (f64, f64),
) -> ScreenPoint {
    if let Some(p) = pointer {
        // Keyboard-triggered clicks report (0, 0).
        if p.x != 0.0 || p.y != 0.0 {
            return p;
        }
    }
    if let Some(b) = element {
        return b.center();
    }
    ScreenPoint::new(viewport.0 / 2.0, viewport.1 / 2.0)
}
