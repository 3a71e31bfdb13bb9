//! Host Messages
//!
//! Messages sent from the [`LiveSession`](crate::host::LiveSession) host to a
//! rendering surface. These are the only way state flows downward: a surface
//! applies them to its own display state and never touches the conversation
//! log or the media resource directly.
//!
//! # Design Philosophy
//!
//! The surface is a passive renderer. Every message here is a fact ("a
//! message was appended", "the media session is now active") or a directive
//! ("scroll to the newest entry"), never a question.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::conversation::Message;
use crate::media::{AcquisitionErrorKind, MediaSnapshot};
use crate::overlay::OverlayPanel;

/// Messages from the host to a rendering surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum HostMessage {
    // ============================================
    // Conversation
    // ============================================
    /// A message was appended to the conversation log
    MessageAppended {
        /// The appended message
        message: Message,
    },

    /// Scroll the conversation view to its newest entry
    ///
    /// Always follows a [`HostMessage::MessageAppended`].
    ScrollToBottom {
        /// The newest message
        message_id: MessageId,
    },

    /// The input buffer was consumed by a submit
    InputCleared,

    // ============================================
    // Media
    // ============================================
    /// The media panel was mounted or unmounted
    MediaVisibility {
        /// Whether the media panel is shown
        visible: bool,
    },

    /// The media session changed state
    MediaState {
        /// Current media session snapshot
        snapshot: MediaSnapshot,
    },

    /// Capture acquisition failed
    MediaError {
        /// Failure category
        kind: AcquisitionErrorKind,
        /// Human-readable description
        message: String,
    },

    /// The auxiliary overlay selection changed
    Overlay {
        /// The panel now shown, if any
        active: Option<OverlayPanel>,
    },

    // ============================================
    // System
    // ============================================
    /// User-visible notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// Session information, sent once on start
    SessionInfo {
        /// Session ID
        session_id: SessionId,
    },

    /// Request the surface to quit
    Quit {
        /// Optional goodbye message
        message: Option<String>,
    },
}

/// Who sent a conversation message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    /// The person at the keyboard
    Local,
    /// The simulated counterpart
    Remote,
}

impl Sender {
    /// Label used by surfaces when rendering a message
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Local => "You",
            Self::Remote => "Assistant",
        }
    }
}

/// Message identifier
///
/// Derived from the creation time in milliseconds. Two messages created in the
/// same millisecond get consecutive values, so identifiers are strictly
/// increasing within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Generate the next message ID
    pub fn new() -> Self {
        static LAST: AtomicU64 = AtomicU64::new(0);

        let now = now_ms();
        let mut prev = LAST.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match LAST.compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::Relaxed) {
                Ok(_) => return Self(next),
                Err(actual) => prev = actual,
            }
        }
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg_{}", self.0)
    }
}

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new unique session ID
    pub fn new() -> Self {
        Self(format!("session_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}

/// Current timestamp in milliseconds
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
