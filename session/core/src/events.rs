//! Host Events
//!
//! Events sent from a rendering surface to the
//! [`LiveSession`](crate::host::LiveSession) host. A surface reports what the
//! user did; the host decides what it means.

use serde::{Deserialize, Serialize};

use crate::overlay::OverlayPanel;

/// Events from a surface to the host
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum HostEvent {
    // ============================================
    // Conversation
    // ============================================
    /// The draft input changed
    InputChanged {
        /// Full contents of the input field
        text: String,
    },

    /// Submit whatever is in the draft input
    SubmitInput,

    /// Submit explicit text, bypassing the draft input
    UserMessage {
        /// The message content
        content: String,
    },

    /// User scrolled the conversation
    UserScrolled {
        /// Direction of scroll
        direction: ScrollDirection,
    },

    // ============================================
    // Media
    // ============================================
    /// Show the media panel and start a capture session
    OpenMedia,

    /// Close the capture session and hide the media panel
    CloseMedia,

    /// Camera button: open the media panel if hidden, close it otherwise
    ToggleMedia,

    /// Mute or unmute the microphone
    ToggleAudio,

    /// Turn the camera on or off
    ToggleVideo,

    /// Select an auxiliary overlay panel (toggles back off if already shown)
    SelectOverlay {
        /// The panel that was clicked
        panel: OverlayPanel,
    },

    /// The gift button in the media controls was pressed
    GiftPressed,

    // ============================================
    // Lifecycle
    // ============================================
    /// User requested quit
    QuitRequested,
}

impl HostEvent {
    /// Short name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InputChanged { .. } => "input_changed",
            Self::SubmitInput => "submit_input",
            Self::UserMessage { .. } => "user_message",
            Self::UserScrolled { .. } => "user_scrolled",
            Self::OpenMedia => "open_media",
            Self::CloseMedia => "close_media",
            Self::ToggleMedia => "toggle_media",
            Self::ToggleAudio => "toggle_audio",
            Self::ToggleVideo => "toggle_video",
            Self::SelectOverlay { .. } => "select_overlay",
            Self::GiftPressed => "gift_pressed",
            Self::QuitRequested => "quit_requested",
        }
    }
}

/// Scroll direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollDirection {
    /// Towards older messages
    Up,
    /// Towards newer messages
    Down,
    /// Oldest message
    Top,
    /// Newest message
    Bottom,
}
