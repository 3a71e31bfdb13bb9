//! Media Session Controller
//!
//! Drives one live capture session through `Idle → Acquiring → Active → Closed`.
//!
//! # Resource ownership
//!
//! The capture stream lives inside [`MediaState::Active`] and nowhere else.
//! Teardown swaps the state slot for `Closed` and releases whatever the old
//! state held, so it always sees the resource that is live at that moment.
//!
//! Acquisition runs as a tokio task that reports back over a channel owned by
//! the controller. A result is only installed if the controller is still
//! waiting for that exact request; anything else is released on the spot.
//! Acquired streams travel as [`HeldStream`] guards, which release on drop.
//! A result bounced off a closed channel, or still sitting in the channel
//! buffer when the controller goes away, is released by its guard, so a
//! stream that shows up after teardown is never leaked.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use super::device::{
    CaptureConstraints, CaptureDevice, CaptureStream, DeviceError, HeldStream, TrackKind,
};

/// Identifies one acquisition request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AcquireTicket(u64);

/// Why a session ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// Explicit close intent
    UserClosed,
    /// The controller was dropped
    Unmounted,
    /// The device refused or failed
    AcquisitionFailed(DeviceError),
}

/// Media session state
#[derive(Debug)]
pub enum MediaState {
    /// Not started
    Idle,
    /// Waiting for the device
    Acquiring {
        /// The outstanding request
        ticket: AcquireTicket,
    },
    /// Capturing
    Active {
        /// The live resource, owned here exclusively
        stream: CaptureStream,
        /// Microphone flag
        audio_enabled: bool,
        /// Camera flag
        video_enabled: bool,
    },
    /// Terminal
    Closed {
        /// Why the session ended
        reason: CloseReason,
    },
}

impl MediaState {
    /// Data-free view of the state
    #[must_use]
    pub fn phase(&self) -> MediaPhase {
        match self {
            Self::Idle => MediaPhase::Idle,
            Self::Acquiring { .. } => MediaPhase::Acquiring,
            Self::Active { .. } => MediaPhase::Active,
            Self::Closed { .. } => MediaPhase::Closed,
        }
    }
}

/// State tag without the resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaPhase {
    /// Not started
    Idle,
    /// Waiting for the device
    Acquiring,
    /// Capturing
    Active,
    /// Ended
    Closed,
}

impl MediaPhase {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Acquiring => "Requesting camera...",
            Self::Active => "Live",
            Self::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for MediaPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Renderable description of the active stream, for local preview only
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPreview {
    /// Stream identifier
    pub stream_id: String,
    /// Device that produced the stream
    pub device: String,
    /// One entry per track
    pub tracks: Vec<TrackPreview>,
}

/// Preview of one track
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPreview {
    /// Audio or video
    pub kind: TrackKind,
    /// Device label
    pub label: String,
    /// Current enabled flag
    pub enabled: bool,
}

/// Read-only snapshot of the media session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSnapshot {
    /// Current phase
    pub phase: MediaPhase,
    /// Microphone flag (false unless active)
    pub audio_enabled: bool,
    /// Camera flag (false unless active)
    pub video_enabled: bool,
    /// Active stream preview
    pub preview: Option<StreamPreview>,
    /// Acquisition failure, if that is why the session closed
    pub error: Option<DeviceError>,
}

/// Result of applying an acquisition outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaUpdate {
    /// The stream was installed
    Activated,
    /// Acquisition failed; reported exactly once
    Failed(DeviceError),
    /// A result arrived that nobody was waiting for and was released
    Discarded,
}

/// Rejected media intents
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    /// The intent is not valid from the current phase
    #[error("Cannot {intent} while media session is {from:?}")]
    InvalidTransition {
        /// Phase the intent arrived in
        from: MediaPhase,
        /// The rejected intent
        intent: &'static str,
    },

    /// Toggles need a live stream
    #[error("Media session is not active ({0:?})")]
    NotActive(MediaPhase),

    /// The track kind was never requested
    #[error("No {0} track was captured")]
    TrackNotCaptured(TrackKind),
}

struct AcquireOutcome<D: CaptureDevice + 'static> {
    ticket: AcquireTicket,
    result: Result<HeldStream<D>, DeviceError>,
}

/// Owns one live capture session
pub struct MediaSessionController<D: CaptureDevice + 'static> {
    device: Arc<D>,
    constraints: CaptureConstraints,
    /// The only place the resource is ever held
    state: MediaState,
    next_ticket: u64,
    outcomes_tx: mpsc::UnboundedSender<AcquireOutcome<D>>,
    outcomes_rx: mpsc::UnboundedReceiver<AcquireOutcome<D>>,
}

impl<D: CaptureDevice + 'static> MediaSessionController<D> {
    /// Create an idle controller
    pub fn new(device: Arc<D>, constraints: CaptureConstraints) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            device,
            constraints,
            state: MediaState::Idle,
            next_ticket: 0,
            outcomes_tx,
            outcomes_rx,
        }
    }

    /// Current state
    pub fn state(&self) -> &MediaState {
        &self.state
    }

    /// Current phase
    pub fn phase(&self) -> MediaPhase {
        self.state.phase()
    }

    /// Requested capture constraints
    pub fn constraints(&self) -> CaptureConstraints {
        self.constraints
    }

    /// Begin acquiring a capture stream
    ///
    /// Only valid from `Idle`. The request runs in the background; call
    /// [`poll_acquisition`](Self::poll_acquisition) to apply its result.
    pub fn start(&mut self) -> Result<(), MediaError> {
        if !matches!(self.state, MediaState::Idle) {
            return Err(MediaError::InvalidTransition {
                from: self.phase(),
                intent: "start",
            });
        }

        let ticket = AcquireTicket(self.next_ticket);
        self.next_ticket += 1;
        self.state = MediaState::Acquiring { ticket };

        let device = Arc::clone(&self.device);
        let constraints = self.constraints;
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = AssertUnwindSafe(device.acquire(&constraints))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(DeviceError::Failed("capture backend panicked".to_string()))
                })
                .map(|stream| HeldStream::new(stream, Arc::clone(&device)));

            // Controller is closed or gone: the bounced guard releases the stream
            if let Err(mpsc::error::SendError(outcome)) = tx.send(AcquireOutcome { ticket, result })
            {
                if let Ok(held) = &outcome.result {
                    tracing::debug!(
                        stream_id = held.stream().map(CaptureStream::id),
                        "Releasing stream acquired after teardown"
                    );
                }
            }
        });

        tracing::debug!(
            device = self.device.name(),
            audio = constraints.audio,
            video = constraints.video,
            "Capture acquisition started"
        );
        Ok(())
    }

    /// Apply a finished acquisition, if one is waiting
    pub fn poll_acquisition(&mut self) -> Option<MediaUpdate> {
        let outcome = self.outcomes_rx.try_recv().ok()?;
        Some(self.apply_outcome(outcome))
    }

    fn apply_outcome(&mut self, outcome: AcquireOutcome<D>) -> MediaUpdate {
        let awaiting =
            matches!(self.state, MediaState::Acquiring { ticket } if ticket == outcome.ticket);

        if !awaiting {
            if let Ok(held) = outcome.result {
                tracing::debug!(
                    stream_id = held.stream().map(CaptureStream::id),
                    phase = ?self.phase(),
                    "Discarding stale capture stream"
                );
                drop(held);
            }
            return MediaUpdate::Discarded;
        }

        match outcome.result.map(HeldStream::into_inner) {
            Ok(None) => MediaUpdate::Discarded,
            Ok(Some(stream)) => {
                tracing::info!(
                    stream_id = stream.id(),
                    tracks = stream.tracks().len(),
                    "Media session active"
                );
                self.state = MediaState::Active {
                    stream,
                    audio_enabled: self.constraints.audio,
                    video_enabled: self.constraints.video,
                };
                MediaUpdate::Activated
            }
            Err(error) => {
                tracing::warn!(error = %error, "Capture acquisition failed");
                self.state = MediaState::Closed {
                    reason: CloseReason::AcquisitionFailed(error.clone()),
                };
                self.outcomes_rx.close();
                MediaUpdate::Failed(error)
            }
        }
    }

    /// Flip the microphone flag; returns the new value
    pub fn toggle_audio(&mut self) -> Result<bool, MediaError> {
        self.toggle(TrackKind::Audio)
    }

    /// Flip the camera flag; returns the new value
    pub fn toggle_video(&mut self) -> Result<bool, MediaError> {
        self.toggle(TrackKind::Video)
    }

    fn toggle(&mut self, kind: TrackKind) -> Result<bool, MediaError> {
        let phase = self.phase();
        let MediaState::Active {
            stream,
            audio_enabled,
            video_enabled,
        } = &mut self.state
        else {
            return Err(MediaError::NotActive(phase));
        };

        if !self.constraints.requests(kind) {
            return Err(MediaError::TrackNotCaptured(kind));
        }

        let flag = match kind {
            TrackKind::Audio => audio_enabled,
            TrackKind::Video => video_enabled,
        };
        *flag = !*flag;
        let enabled = *flag;

        for track in stream.tracks_of(kind) {
            self.device.set_track_enabled(track, enabled);
        }

        tracing::debug!(kind = %kind, enabled, "Track toggled");
        Ok(enabled)
    }

    /// End the session, releasing whatever is currently held
    ///
    /// Valid from any state; returns `false` if already closed.
    pub fn close(&mut self) -> bool {
        self.teardown(CloseReason::UserClosed)
    }

    fn teardown(&mut self, reason: CloseReason) -> bool {
        if matches!(self.state, MediaState::Closed { .. }) {
            return false;
        }

        let previous = std::mem::replace(&mut self.state, MediaState::Closed { reason });
        let from = previous.phase();
        if let MediaState::Active { stream, .. } = previous {
            stream.release(self.device.as_ref());
        }

        self.drain_outcomes();

        tracing::info!(from = ?from, "Media session closed");
        true
    }

    /// Close the outcome channel and release anything already delivered
    ///
    /// A send racing with the close can still land afterwards; its guard
    /// releases it when the receiver is dropped.
    fn drain_outcomes(&mut self) {
        self.outcomes_rx.close();
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            drop(outcome);
        }
    }

    /// Preview of the active stream
    pub fn preview(&self) -> Option<StreamPreview> {
        let MediaState::Active {
            stream,
            audio_enabled,
            video_enabled,
        } = &self.state
        else {
            return None;
        };

        let tracks = stream
            .tracks()
            .iter()
            .map(|t| TrackPreview {
                kind: t.kind,
                label: t.label.clone(),
                enabled: match t.kind {
                    TrackKind::Audio => *audio_enabled,
                    TrackKind::Video => *video_enabled,
                },
            })
            .collect();

        Some(StreamPreview {
            stream_id: stream.id().to_string(),
            device: self.device.name().to_string(),
            tracks,
        })
    }

    /// Read-only snapshot for rendering
    pub fn snapshot(&self) -> MediaSnapshot {
        let (audio_enabled, video_enabled) = match &self.state {
            MediaState::Active {
                audio_enabled,
                video_enabled,
                ..
            } => (*audio_enabled, *video_enabled),
            _ => (false, false),
        };
        let error = match &self.state {
            MediaState::Closed {
                reason: CloseReason::AcquisitionFailed(error),
            } => Some(error.clone()),
            _ => None,
        };

        MediaSnapshot {
            phase: self.phase(),
            audio_enabled,
            video_enabled,
            preview: self.preview(),
            error,
        }
    }
}

impl<D: CaptureDevice + 'static> Drop for MediaSessionController<D> {
    fn drop(&mut self) {
        if !self.teardown(CloseReason::Unmounted) {
            // Already closed: a late result may have landed since
            self.drain_outcomes();
        }
    }
}
