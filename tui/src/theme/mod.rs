//! Theme and Colors
//!
//! Palette for the live session surface.

use ratatui::style::Color;

use live_session_core::{MediaPhase, NotifyLevel};

// ============================================================================
// Conversation
// ============================================================================

/// Local sender (the person at the keyboard)
pub const LOCAL_GREEN: Color = Color::Rgb(130, 220, 130);

/// Simulated counterpart
pub const REMOTE_MAGENTA: Color = Color::Magenta;

/// Scroll fade near the viewport edges
pub const FADE_DARK: Color = Color::Rgb(80, 80, 80);

/// Second fade step
pub const FADE_LIGHT: Color = Color::Rgb(120, 120, 120);

// ============================================================================
// Media
// ============================================================================

/// "On air" indicator
pub const LIVE_RED: Color = Color::Rgb(255, 70, 70);

/// Muted / camera-off
pub const MUTED_AMBER: Color = Color::Rgb(255, 190, 90);

/// Waiting for the device
pub const PENDING_BLUE: Color = Color::Rgb(150, 180, 255);

// ============================================================================
// UI Colors
// ============================================================================

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Warning yellow
pub const WARNING_YELLOW: Color = Color::Rgb(240, 210, 90);

/// Success green
pub const SUCCESS_GREEN: Color = Color::Rgb(120, 230, 120);

/// Color for a notification level
pub fn notify_color(level: NotifyLevel) -> Color {
    match level {
        NotifyLevel::Info => SUCCESS_GREEN,
        NotifyLevel::Warning => WARNING_YELLOW,
        NotifyLevel::Error => ERROR_RED,
    }
}

/// Accent color for the media panel border
pub fn phase_color(phase: MediaPhase) -> Color {
    match phase {
        MediaPhase::Idle | MediaPhase::Acquiring => PENDING_BLUE,
        MediaPhase::Active => LIVE_RED,
        MediaPhase::Closed => DIM_GRAY,
    }
}
