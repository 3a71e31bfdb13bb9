//! Display State Types
//!
//! Types that represent the current display state for the TUI.
//! These are derived from HostMessages and used for rendering.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client" - it just renders what the session host tells
//! it to. Display state is the bridge between HostMessages and rendering.
//!
//! - DisplayMessage: A rendered conversation message
//! - DisplayMedia: The media panel as last reported by the host
//! - DisplayNotification: A transient status-bar notice

use std::time::Duration;

use live_session_core::{
    AcquisitionErrorKind, HostMessage, MediaPhase, MediaSnapshot, MessageId, NotifyLevel,
    OverlayPanel, Sender, SessionId,
};

/// How long a notification stays in the status bar
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// A rendered conversation message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayMessage {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub sender: Sender,
    /// The message content
    pub content: String,
}

impl DisplayMessage {
    /// Prefix shown before the content
    pub fn prefix(&self) -> String {
        format!("{}: ", self.sender.label())
    }
}

/// Media panel state for rendering
#[derive(Clone, Debug, Default)]
pub struct DisplayMedia {
    /// Whether the panel is mounted
    pub visible: bool,
    /// Last reported session snapshot
    pub snapshot: Option<MediaSnapshot>,
    /// Acquisition failure, if any
    pub error: Option<(AcquisitionErrorKind, String)>,
    /// Overlay shown over the panel
    pub overlay: Option<OverlayPanel>,
}

impl DisplayMedia {
    /// Current phase, `Idle` until the host reports one
    pub fn phase(&self) -> MediaPhase {
        self.snapshot
            .as_ref()
            .map_or(MediaPhase::Idle, |s| s.phase)
    }

    /// Whether the capture is live
    pub fn is_live(&self) -> bool {
        self.visible && self.phase() == MediaPhase::Active
    }

    fn unmount(&mut self) {
        *self = Self::default();
    }
}

/// A notification to display
#[derive(Clone, Debug)]
pub struct DisplayNotification {
    /// Notification level
    pub level: NotifyLevel,
    /// Message content
    pub message: String,
    /// Time left before it disappears
    pub remaining: Duration,
}

/// The full display state for the TUI
#[derive(Debug, Default)]
pub struct DisplayState {
    /// Conversation messages
    pub messages: Vec<DisplayMessage>,
    /// Draft input mirrored to the host
    pub input: String,
    /// Scroll offset (lines from bottom, 0 = latest)
    pub scroll_offset: usize,
    /// Media panel
    pub media: DisplayMedia,
    /// Session info
    pub session_id: Option<SessionId>,
    /// Pending notification (if any)
    pub notification: Option<DisplayNotification>,
    /// Set once the host asked the surface to quit
    pub quitting: bool,
    /// Goodbye text from the host
    pub goodbye: Option<String>,
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a HostMessage to update display state
    pub fn apply_message(&mut self, msg: HostMessage) {
        match msg {
            // Conversation
            HostMessage::MessageAppended { message } => {
                self.messages.push(DisplayMessage {
                    id: message.id,
                    sender: message.sender,
                    content: message.text,
                });
            }
            HostMessage::ScrollToBottom { .. } => {
                self.scroll_offset = 0;
            }
            HostMessage::InputCleared => {
                self.input.clear();
            }

            // Media
            HostMessage::MediaVisibility { visible } => {
                if visible {
                    self.media.visible = true;
                    self.media.error = None;
                } else {
                    self.media.unmount();
                }
            }
            HostMessage::MediaState { snapshot } => {
                if snapshot.phase != MediaPhase::Closed {
                    self.media.error = None;
                }
                self.media.snapshot = Some(snapshot);
            }
            HostMessage::MediaError { kind, message } => {
                self.media.error = Some((kind, message));
            }
            HostMessage::Overlay { active } => {
                self.media.overlay = active;
            }

            // System
            HostMessage::Notify { level, message } => {
                self.notification = Some(DisplayNotification {
                    level,
                    message,
                    remaining: NOTIFICATION_TTL,
                });
            }
            HostMessage::SessionInfo { session_id } => {
                self.session_id = Some(session_id);
            }
            HostMessage::Quit { message } => {
                // The app will handle quitting
                self.quitting = true;
                self.goodbye = message;
            }
        }
    }

    /// Update timers
    pub fn update(&mut self, delta: Duration) {
        if let Some(notification) = &mut self.notification {
            notification.remaining = notification.remaining.saturating_sub(delta);
            if notification.remaining.is_zero() {
                self.notification = None;
            }
        }
    }

    /// Scroll towards older messages, bounded by `total_lines`
    pub fn scroll_up(&mut self, lines: usize, total_lines: usize) {
        let max_scroll = total_lines.saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    /// Scroll towards newer messages
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Clear the notification
    pub fn clear_notification(&mut self) {
        self.notification = None;
    }
}
