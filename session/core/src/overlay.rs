//! Overlay Selection
//!
//! The auxiliary popups layered over the media view. At most one is shown;
//! picking the shown one again hides it.

use serde::{Deserialize, Serialize};

/// Auxiliary panels available over the media view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayPanel {
    /// In-call chat popup
    Chat,
    /// Call settings popup
    Settings,
}

impl OverlayPanel {
    /// Popup title
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::Settings => "Settings",
        }
    }
}

/// Single-choice panel selector with toggle-to-none
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverlaySelection {
    active: Option<OverlayPanel>,
}

impl OverlaySelection {
    /// Nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently shown panel
    pub fn active(&self) -> Option<OverlayPanel> {
        self.active
    }

    /// Select `panel`, or hide it if it is already shown
    ///
    /// Returns the resulting selection.
    pub fn select(&mut self, panel: OverlayPanel) -> Option<OverlayPanel> {
        self.active = if self.active == Some(panel) {
            None
        } else {
            Some(panel)
        };
        self.active
    }

    /// Hide whatever is shown
    pub fn clear(&mut self) {
        self.active = None;
    }
}
