//! Live Session Core - Headless chat and live-media session host
//!
//! This crate holds the whole behaviour of a live session (a text
//! conversation with a simulated counterpart, plus an optional local
//! camera/microphone capture panel) independent of any UI framework.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         UI Surfaces                              │
//! │        ┌───────────────┐          ┌──────────────────────┐       │
//! │        │      TUI      │          │  Headless / Tests    │       │
//! │        │   (ratatui)   │          │                      │       │
//! │        └───────┬───────┘          └──────────┬───────────┘       │
//! │                └──────────────┬──────────────┘                   │
//! │                        HostEvent (up)                            │
//! │                       HostMessage (down)                         │
//! └───────────────────────────────┼──────────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────┼──────────────────────────────────┐
//! │                        LIVE SESSION CORE                         │
//! │  ┌────────────────────────────┴───────────────────────────────┐  │
//! │  │                        LiveSession                         │  │
//! │  │  ┌──────────────┐  ┌───────────────────┐  ┌─────────────┐  │  │
//! │  │  │ Conversation │  │ MediaSession      │  │  Overlay    │  │  │
//! │  │  │   Stream     │  │ Controller        │  │  Selection  │  │  │
//! │  │  └──────────────┘  └─────────┬─────────┘  └─────────────┘  │  │
//! │  └──────────────────────────────┼─────────────────────────────┘  │
//! │                          CaptureDevice (down)                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`LiveSession`]: The host that owns every subsystem
//! - [`HostMessage`]: Messages sent from the host to UI surfaces
//! - [`HostEvent`]: Events sent from UI surfaces to the host
//! - [`ConversationStream`]: Append-only message log with deferred replies
//! - [`MediaSessionController`]: Capture acquisition and teardown state machine
//! - [`OverlaySelection`]: Toggle-to-none panel selector
//!
//! # Quick Start
//!
//! ```ignore
//! use live_session_core::{
//!     config::load_config, HostEvent, LiveSession,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!
//!     let mut session = LiveSession::new(
//!         config.simulated_device(),
//!         config.session_config(),
//!         tx,
//!     );
//!     session.start().await;
//!
//!     session.handle_event(HostEvent::UserMessage {
//!         content: "hello".to_string(),
//!     }).await?;
//!
//!     loop {
//!         // Apply due replies and capture results
//!         session.poll().await;
//!
//!         while let Ok(msg) = rx.try_recv() {
//!             // Render message to UI
//!         }
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`conversation`]: Message log and the simulated counterpart
//! - [`media`]: Capture device seam, session controller, simulated device
//! - [`overlay`]: Auxiliary panel selection
//! - [`host`]: The `LiveSession` aggregate
//! - [`events`]: Events from UI surfaces to the host
//! - [`messages`]: Messages from the host to UI surfaces
//! - [`config`]: TOML/env/CLI configuration
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod conversation;
pub mod events;
pub mod host;
pub mod media;
pub mod messages;
pub mod overlay;

// Re-export main types for convenience
pub use conversation::{ConversationConfig, ConversationStream, Message};
pub use events::{HostEvent, ScrollDirection};
pub use host::{LiveSession, LiveSessionConfig, SessionSnapshot};
pub use media::{
    AcquisitionErrorKind, CaptureConstraints, CaptureDevice, CaptureStream, CloseReason,
    DeviceError, HeldStream, MediaError, MediaPhase, MediaSessionController, MediaSnapshot,
    MediaState, MediaTrack, MediaUpdate, SimulatedCaptureDevice, SimulatedOutcome,
    StreamPreview, TrackKind,
};
pub use messages::{HostMessage, MessageId, NotifyLevel, SessionId, Sender};
pub use overlay::{OverlayPanel, OverlaySelection};

// Re-export config types
pub use config::{
    load_config, load_config_from_path, ConfigError, ConfigOverrides, ConfigSource,
    SessionConfigFile,
};
