//! TOML Configuration File Support
//!
//! Centralized configuration loading for the live session, from a TOML file
//! at `~/.config/live-session/session.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [conversation]
//! reply_delay_ms = 1000
//! reply_text = "This is a simulated response from the chatbot."
//!
//! [media]
//! audio = true
//! video = true
//!
//! [device]
//! latency_ms = 300
//! outcome = "grant"   # grant | deny | unavailable
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::{ConversationConfig, DEFAULT_REPLY_DELAY, DEFAULT_REPLY_TEXT};
use crate::host::LiveSessionConfig;
use crate::media::{CaptureConstraints, SimulatedCaptureDevice, SimulatedOutcome};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Conversation section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationToml {
    /// Delay before the simulated reply, in milliseconds
    pub reply_delay_ms: Option<u64>,
    /// Fixed reply content
    pub reply_text: Option<String>,
}

/// Media section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaToml {
    /// Request a microphone track
    pub audio: Option<bool>,
    /// Request a camera track
    pub video: Option<bool>,
}

/// Simulated device section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceToml {
    /// Acquisition latency in milliseconds
    pub latency_ms: Option<u64>,
    /// Permission prompt answer
    pub outcome: Option<SimulatedOutcome>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Conversation section
    pub conversation: ConversationToml,
    /// Media section
    pub media: MediaToml,
    /// Simulated device section
    pub device: DeviceToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration from every source
#[derive(Clone, Debug)]
pub struct SessionConfigFile {
    /// Delay before the simulated reply
    pub reply_delay: Duration,
    /// Fixed reply content
    pub reply_text: String,
    /// Requested capture track kinds
    pub constraints: CaptureConstraints,
    /// Simulated acquisition latency
    pub device_latency: Duration,
    /// Simulated permission answer
    pub device_outcome: SimulatedOutcome,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    /// Source of configuration values
    source: ConfigSource,
}

impl Default for SessionConfigFile {
    fn default() -> Self {
        Self {
            reply_delay: DEFAULT_REPLY_DELAY,
            reply_text: DEFAULT_REPLY_TEXT.to_string(),
            constraints: CaptureConstraints::default(),
            device_latency: Duration::from_millis(300),
            device_outcome: SimulatedOutcome::Grant,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl SessionConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.constraints.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one of media.audio or media.video must be enabled".to_string(),
            ));
        }
        if self.reply_text.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "conversation.reply_text must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Runtime configuration for [`LiveSession`](crate::host::LiveSession)
    #[must_use]
    pub fn session_config(&self) -> LiveSessionConfig {
        LiveSessionConfig {
            conversation: ConversationConfig {
                reply_delay: self.reply_delay,
                reply_text: self.reply_text.clone(),
            },
            constraints: self.constraints,
        }
    }

    /// Simulated capture device described by this configuration
    #[must_use]
    pub fn simulated_device(&self) -> SimulatedCaptureDevice {
        SimulatedCaptureDevice::new()
            .with_latency(self.device_latency)
            .with_outcome(self.device_outcome)
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/live-session/session.toml` or
/// `~/.config/live-session/session.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("live-session").join("session.toml"))
}

/// Load configuration from the default path, then the environment
pub fn load_config() -> Result<SessionConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from `path` (missing file = defaults), then the environment
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<SessionConfigFile, ConfigError> {
    let mut config = SessionConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: SessionToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut SessionConfigFile, toml: &SessionToml) {
    if let Some(ms) = toml.conversation.reply_delay_ms {
        config.reply_delay = Duration::from_millis(ms);
    }
    if let Some(ref text) = toml.conversation.reply_text {
        config.reply_text = text.clone();
    }

    if let Some(audio) = toml.media.audio {
        config.constraints.audio = audio;
    }
    if let Some(video) = toml.media.video {
        config.constraints.video = video;
    }

    if let Some(ms) = toml.device.latency_ms {
        config.device_latency = Duration::from_millis(ms);
    }
    if let Some(outcome) = toml.device.outcome {
        config.device_outcome = outcome;
    }
}

fn parse_flag(value: &str) -> bool {
    value != "0" && value.to_lowercase() != "false"
}

fn apply_env_config(config: &mut SessionConfigFile) {
    if let Ok(delay) = std::env::var("LIVE_SESSION_REPLY_DELAY_MS") {
        if let Ok(ms) = delay.parse::<u64>() {
            config.reply_delay = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(text) = std::env::var("LIVE_SESSION_REPLY_TEXT") {
        config.reply_text = text;
        config.source = ConfigSource::Env;
    }
    if let Ok(audio) = std::env::var("LIVE_SESSION_CAPTURE_AUDIO") {
        config.constraints.audio = parse_flag(&audio);
        config.source = ConfigSource::Env;
    }
    if let Ok(video) = std::env::var("LIVE_SESSION_CAPTURE_VIDEO") {
        config.constraints.video = parse_flag(&video);
        config.source = ConfigSource::Env;
    }
    if let Ok(latency) = std::env::var("LIVE_SESSION_DEVICE_LATENCY_MS") {
        if let Ok(ms) = latency.parse::<u64>() {
            config.device_latency = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(outcome) = std::env::var("LIVE_SESSION_DEVICE_OUTCOME") {
        match SimulatedOutcome::parse(&outcome) {
            Some(outcome) => {
                config.device_outcome = outcome;
                config.source = ConfigSource::Env;
            }
            None => tracing::warn!(value = %outcome, "Ignoring unknown LIVE_SESSION_DEVICE_OUTCOME"),
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Reply delay override (milliseconds)
    pub reply_delay_ms: Option<u64>,
    /// Reply text override
    pub reply_text: Option<String>,
    /// Camera-only capture override
    pub video_only: Option<bool>,
    /// Device latency override (milliseconds)
    pub device_latency_ms: Option<u64>,
    /// Device outcome override
    pub device_outcome: Option<SimulatedOutcome>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set reply delay override
    #[must_use]
    pub fn with_reply_delay_ms(mut self, ms: u64) -> Self {
        self.reply_delay_ms = Some(ms);
        self
    }

    /// Set reply text override
    #[must_use]
    pub fn with_reply_text(mut self, text: String) -> Self {
        self.reply_text = Some(text);
        self
    }

    /// Request video only
    #[must_use]
    pub fn with_video_only(mut self, video_only: bool) -> Self {
        self.video_only = Some(video_only);
        self
    }

    /// Set device latency override
    #[must_use]
    pub fn with_device_latency_ms(mut self, ms: u64) -> Self {
        self.device_latency_ms = Some(ms);
        self
    }

    /// Set device outcome override
    #[must_use]
    pub fn with_device_outcome(mut self, outcome: SimulatedOutcome) -> Self {
        self.device_outcome = Some(outcome);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut SessionConfigFile) {
        if self.reply_delay_ms.is_some()
            || self.reply_text.is_some()
            || self.video_only.is_some()
            || self.device_latency_ms.is_some()
            || self.device_outcome.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ms) = self.reply_delay_ms {
            config.reply_delay = Duration::from_millis(ms);
        }
        if let Some(ref text) = self.reply_text {
            config.reply_text = text.clone();
        }
        if let Some(true) = self.video_only {
            config.constraints = CaptureConstraints::video_only();
        }
        if let Some(ms) = self.device_latency_ms {
            config.device_latency = Duration::from_millis(ms);
        }
        if let Some(outcome) = self.device_outcome {
            config.device_outcome = outcome;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
