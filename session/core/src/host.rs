//! Live Session Host
//!
//! The `LiveSession` owns the conversation, the media panel and the overlay
//! selection. Surfaces talk to it only through [`HostEvent`]s; it answers
//! with [`HostMessage`]s on the channel it was given.
//!
//! All state lives on the host's own turn. Background work (reply timers,
//! capture acquisition) only posts completions, which [`LiveSession::poll`]
//! applies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::conversation::{ConversationConfig, ConversationStream, Message};
use crate::events::HostEvent;
use crate::media::{
    CaptureConstraints, CaptureDevice, MediaPhase, MediaSessionController, MediaSnapshot,
    MediaUpdate, TrackKind,
};
use crate::messages::{HostMessage, NotifyLevel, SessionId};
use crate::overlay::{OverlayPanel, OverlaySelection};

/// Runtime configuration for a [`LiveSession`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveSessionConfig {
    /// Deferred-reply settings
    pub conversation: ConversationConfig,
    /// Track kinds requested when the media panel opens
    pub constraints: CaptureConstraints,
}

/// Mounted media view: one capture session plus its overlay selection
///
/// Unmounting drops both, so the overlay never outlives the session.
struct MediaPanel<D: CaptureDevice + 'static> {
    controller: MediaSessionController<D>,
    overlay: OverlaySelection,
}

/// Full read view of the session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier
    pub session_id: SessionId,
    /// Conversation log, oldest first
    pub messages: Vec<Message>,
    /// Draft input
    pub input: String,
    /// Whether the media panel is mounted
    pub media_visible: bool,
    /// Media session, when mounted
    pub media: Option<MediaSnapshot>,
    /// Overlay shown over the media panel
    pub overlay: Option<OverlayPanel>,
}

/// The session host
pub struct LiveSession<D: CaptureDevice + 'static> {
    id: SessionId,
    config: LiveSessionConfig,
    device: Arc<D>,
    conversation: ConversationStream,
    media: Option<MediaPanel<D>>,
    tx: mpsc::UnboundedSender<HostMessage>,
    running: bool,
}

impl<D: CaptureDevice + 'static> LiveSession<D> {
    /// Create a new session host
    pub fn new(
        device: D,
        config: LiveSessionConfig,
        tx: mpsc::UnboundedSender<HostMessage>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            conversation: ConversationStream::new(config.conversation.clone()),
            config,
            device: Arc::new(device),
            media: None,
            tx,
            running: true,
        }
    }

    /// Session identifier
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The capture device backing the media panel
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Whether the session still accepts events
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Announce the session to the surface
    pub async fn start(&mut self) {
        tracing::info!(
            session_id = %self.id,
            device = self.device.name(),
            reply_delay_ms = self.config.conversation.reply_delay.as_millis() as u64,
            "Live session started"
        );
        self.send(HostMessage::SessionInfo {
            session_id: self.id.clone(),
        });
    }

    /// Handle an event from the surface
    pub async fn handle_event(&mut self, event: HostEvent) -> anyhow::Result<()> {
        if !self.running {
            tracing::debug!(event = event.name(), "Ignoring event after shutdown");
            return Ok(());
        }
        tracing::trace!(event = event.name(), "Handling event");

        match event {
            HostEvent::InputChanged { text } => {
                self.conversation.set_input(text);
            }

            HostEvent::SubmitInput => {
                if let Some(message) = self.conversation.submit_input().cloned() {
                    self.emit_append(message, true);
                }
            }

            HostEvent::UserMessage { content } => {
                if let Some(message) = self.conversation.submit(&content).cloned() {
                    self.emit_append(message, false);
                }
            }

            HostEvent::UserScrolled { direction } => {
                tracing::trace!(?direction, "User scrolled");
            }

            HostEvent::OpenMedia => self.open_media(),

            HostEvent::CloseMedia => self.close_media(),

            HostEvent::ToggleMedia => {
                if self.media.is_some() {
                    self.close_media();
                } else {
                    self.open_media();
                }
            }

            HostEvent::ToggleAudio => self.toggle_track(TrackKind::Audio),

            HostEvent::ToggleVideo => self.toggle_track(TrackKind::Video),

            HostEvent::SelectOverlay { panel } => {
                let Some(media) = self.media.as_mut() else {
                    tracing::warn!(panel = panel.title(), "Overlay selected without media panel");
                    self.notify(NotifyLevel::Warning, "Open the media panel first");
                    return Ok(());
                };
                let active = media.overlay.select(panel);
                tracing::debug!(?active, "Overlay selection changed");
                self.send(HostMessage::Overlay { active });
            }

            HostEvent::GiftPressed => {
                self.notify(NotifyLevel::Info, "Gift feature clicked!");
            }

            HostEvent::QuitRequested => {
                self.shutdown().await?;
            }
        }

        Ok(())
    }

    /// Apply finished background work
    ///
    /// Drains due replies and acquisition results, emitting the matching
    /// directives. Returns whether anything was applied.
    pub async fn poll(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let mut changed = false;

        for reply in self.conversation.poll_replies() {
            self.emit_append(reply, false);
            changed = true;
        }

        while let Some(update) = self
            .media
            .as_mut()
            .and_then(|media| media.controller.poll_acquisition())
        {
            changed |= self.apply_media_update(update);
        }

        changed
    }

    /// Full read view of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            messages: self.conversation.messages().to_vec(),
            input: self.conversation.input().to_string(),
            media_visible: self.media.is_some(),
            media: self.media_snapshot(),
            overlay: self.media.as_ref().and_then(|m| m.overlay.active()),
        }
    }

    /// Tear down every subsystem and tell the surface to quit
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;

        self.conversation.teardown();
        if let Some(mut media) = self.media.take() {
            media.controller.close();
        }

        tracing::info!(session_id = %self.id, "Live session shut down");
        self.send(HostMessage::Quit {
            message: Some("Goodbye!".to_string()),
        });

        Ok(())
    }

    fn open_media(&mut self) {
        if let Some(media) = &self.media {
            if media.controller.phase() != MediaPhase::Closed {
                tracing::debug!("Media panel already open");
                return;
            }
            // A failed session stays mounted until reopened or closed
            self.media = None;
        }

        let mut controller =
            MediaSessionController::new(Arc::clone(&self.device), self.config.constraints);
        if let Err(e) = controller.start() {
            tracing::warn!(error = %e, "Could not start media session");
            self.notify(NotifyLevel::Error, &e.to_string());
            return;
        }
        self.media = Some(MediaPanel {
            controller,
            overlay: OverlaySelection::new(),
        });

        self.send(HostMessage::MediaVisibility { visible: true });
        self.send_media_state();
    }

    fn close_media(&mut self) {
        let Some(mut media) = self.media.take() else {
            tracing::debug!("Media panel already closed");
            return;
        };
        media.controller.close();
        let had_overlay = media.overlay.active().is_some();
        drop(media);

        if had_overlay {
            self.send(HostMessage::Overlay { active: None });
        }
        self.send(HostMessage::MediaVisibility { visible: false });
    }

    fn toggle_track(&mut self, kind: TrackKind) {
        let Some(media) = self.media.as_mut() else {
            tracing::warn!(kind = %kind, "Track toggle without media panel");
            self.notify(NotifyLevel::Warning, "Media panel is not open");
            return;
        };

        let result = match kind {
            TrackKind::Audio => media.controller.toggle_audio(),
            TrackKind::Video => media.controller.toggle_video(),
        };

        match result {
            Ok(_) => self.send_media_state(),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected track toggle");
                self.notify(NotifyLevel::Warning, &e.to_string());
            }
        }
    }

    fn apply_media_update(&mut self, update: MediaUpdate) -> bool {
        match update {
            MediaUpdate::Activated => {
                self.send_media_state();
                true
            }
            MediaUpdate::Failed(error) => {
                self.send_media_state();
                self.send(HostMessage::MediaError {
                    kind: error.kind(),
                    message: error.to_string(),
                });
                self.notify(NotifyLevel::Error, &format!("Camera unavailable: {error}"));
                true
            }
            MediaUpdate::Discarded => false,
        }
    }

    fn emit_append(&self, message: Message, from_input: bool) {
        let message_id = message.id;
        self.send(HostMessage::MessageAppended { message });
        self.send(HostMessage::ScrollToBottom { message_id });
        if from_input {
            self.send(HostMessage::InputCleared);
        }
    }

    fn media_snapshot(&self) -> Option<MediaSnapshot> {
        self.media.as_ref().map(|m| m.controller.snapshot())
    }

    fn send_media_state(&self) {
        if let Some(snapshot) = self.media_snapshot() {
            self.send(HostMessage::MediaState { snapshot });
        }
    }

    /// Send notification
    fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(HostMessage::Notify {
            level,
            message: message.to_string(),
        });
    }

    /// Send a message to the surface
    ///
    /// Never waits: the surface drains the channel on this same task, after
    /// the current event or poll returns.
    fn send(&self, msg: HostMessage) {
        if let Err(e) = self.tx.send(msg) {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
