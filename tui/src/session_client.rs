//! Session Client
//!
//! Thin wrapper around the `LiveSession` host for TUI integration.
//! The host is embedded directly (no network); this client turns key
//! presses into `HostEvent`s and hands back the `HostMessage`s it emits.
//!
//! # Architecture
//!
//! The TUI doesn't contain any session logic. Its job is:
//! 1. Convert terminal events to HostEvents
//! 2. Send HostEvents to the host
//! 3. Receive HostMessages
//! 4. Render display state based on messages

use tokio::sync::mpsc;

use live_session_core::{
    HostEvent, HostMessage, LiveSession, OverlayPanel, ScrollDirection, SessionConfigFile,
    SessionSnapshot, SimulatedCaptureDevice,
};

/// Client for communicating with the embedded session host
pub struct SessionClient {
    /// The embedded host
    session: LiveSession<SimulatedCaptureDevice>,
    /// Receiver for messages from the host
    rx: mpsc::UnboundedReceiver<HostMessage>,
}

impl SessionClient {
    /// Create a client around a host built from `config`
    pub fn new(config: &SessionConfigFile) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = LiveSession::new(config.simulated_device(), config.session_config(), tx);
        Self { session, rx }
    }

    /// Announce the session
    pub async fn start(&mut self) {
        self.session.start().await;
    }

    /// Mirror the draft input to the host
    pub async fn input_changed(&mut self, text: String) -> anyhow::Result<()> {
        self.send_event(HostEvent::InputChanged { text }).await
    }

    /// Submit the draft input
    pub async fn submit(&mut self) -> anyhow::Result<()> {
        self.send_event(HostEvent::SubmitInput).await
    }

    /// Camera button
    pub async fn toggle_media(&mut self) -> anyhow::Result<()> {
        self.send_event(HostEvent::ToggleMedia).await
    }

    /// Close the media panel
    pub async fn close_media(&mut self) -> anyhow::Result<()> {
        self.send_event(HostEvent::CloseMedia).await
    }

    /// Mute/unmute
    pub async fn toggle_audio(&mut self) -> anyhow::Result<()> {
        self.send_event(HostEvent::ToggleAudio).await
    }

    /// Camera on/off
    pub async fn toggle_video(&mut self) -> anyhow::Result<()> {
        self.send_event(HostEvent::ToggleVideo).await
    }

    /// Pick an overlay panel
    pub async fn select_overlay(&mut self, panel: OverlayPanel) -> anyhow::Result<()> {
        self.send_event(HostEvent::SelectOverlay { panel }).await
    }

    /// Gift button
    pub async fn gift(&mut self) -> anyhow::Result<()> {
        self.send_event(HostEvent::GiftPressed).await
    }

    /// Notify the host that the user scrolled
    pub async fn user_scrolled(&mut self, direction: ScrollDirection) -> anyhow::Result<()> {
        self.send_event(HostEvent::UserScrolled { direction }).await
    }

    /// Notify the host that the user wants to quit
    pub async fn request_quit(&mut self) -> anyhow::Result<()> {
        self.send_event(HostEvent::QuitRequested).await
    }

    /// Apply finished background work (must be called regularly)
    pub async fn poll(&mut self) -> bool {
        self.session.poll().await
    }

    /// Receive all pending messages from the host (non-blocking)
    pub fn recv_all(&mut self) -> Vec<HostMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Full read view of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Send raw event to the host
    pub async fn send_event(&mut self, event: HostEvent) -> anyhow::Result<()> {
        self.session.handle_event(event).await
    }
}
