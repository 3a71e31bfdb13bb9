//! Live Session TUI - Terminal surface for the live session host
//!
//! A full-screen terminal UI: the conversation on the left and, once opened,
//! the live media panel on the right with its chat/settings popups.
//!
//! # Architecture
//!
//! - **SessionClient**: embeds the `LiveSession` host and forwards intents
//! - **DisplayState**: applies `HostMessage`s into renderable state
//! - **UI**: pure ratatui rendering of the display state

pub mod app;
pub mod display;
pub mod session_client;
pub mod theme;
pub mod ui;

pub use app::App;
