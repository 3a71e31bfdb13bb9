//! Simulated Capture Device
//!
//! An in-process [`CaptureDevice`] with no real hardware behind it. The
//! captured stream is only ever previewed locally, so a simulated device is
//! enough to drive the whole media lifecycle, and it keeps a ledger of which
//! tracks are live so resource ownership can be checked from the outside.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::device::{
    CaptureConstraints, CaptureDevice, CaptureStream, DeviceError, MediaTrack, TrackId, TrackKind,
};

/// What the simulated permission prompt answers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulatedOutcome {
    /// Hand out a stream
    #[default]
    Grant,
    /// Refuse permission
    Deny,
    /// Pretend no device is attached
    Unavailable,
}

impl SimulatedOutcome {
    /// Parse from a config/env string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "grant" | "allow" | "granted" => Some(Self::Grant),
            "deny" | "denied" => Some(Self::Deny),
            "unavailable" | "none" | "missing" => Some(Self::Unavailable),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct TrackRecord {
    kind: TrackKind,
    enabled: bool,
}

#[derive(Debug, Default)]
struct Ledger {
    live: HashMap<TrackId, TrackRecord>,
    acquisitions: usize,
    released: usize,
    enable_propagations: usize,
}

/// Capture device that fabricates tracks after a configurable latency
#[derive(Debug)]
pub struct SimulatedCaptureDevice {
    name: String,
    latency: Duration,
    outcome: Mutex<SimulatedOutcome>,
    ledger: Mutex<Ledger>,
    next_id: AtomicU64,
}

impl Default for SimulatedCaptureDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCaptureDevice {
    /// Device that grants access immediately
    pub fn new() -> Self {
        Self {
            name: "Simulated Camera".to_string(),
            latency: Duration::ZERO,
            outcome: Mutex::new(SimulatedOutcome::Grant),
            ledger: Mutex::new(Ledger::default()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Delay every acquisition by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Answer every acquisition with `outcome`
    #[must_use]
    pub fn with_outcome(self, outcome: SimulatedOutcome) -> Self {
        *self.outcome.lock() = outcome;
        self
    }

    /// Change the answer for future acquisitions
    pub fn set_outcome(&self, outcome: SimulatedOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Tracks handed out and not yet released
    pub fn live_tracks(&self) -> usize {
        self.ledger.lock().live.len()
    }

    /// Tracks released so far
    pub fn released_tracks(&self) -> usize {
        self.ledger.lock().released
    }

    /// Successful acquisitions so far
    pub fn acquisitions(&self) -> usize {
        self.ledger.lock().acquisitions
    }

    /// Number of `set_track_enabled` calls on live tracks
    pub fn enable_propagations(&self) -> usize {
        self.ledger.lock().enable_propagations
    }

    /// Enabled flag of every live track of `kind`
    pub fn live_flags(&self, kind: TrackKind) -> Vec<bool> {
        self.ledger
            .lock()
            .live
            .values()
            .filter(|r| r.kind == kind)
            .map(|r| r.enabled)
            .collect()
    }

    fn fabricate(&self, constraints: &CaptureConstraints) -> CaptureStream {
        let serial = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(MediaTrack {
                id: TrackId(format!("sim-audio-{serial}")),
                kind: TrackKind::Audio,
                label: "Simulated Microphone".to_string(),
            });
        }
        if constraints.video {
            tracks.push(MediaTrack {
                id: TrackId(format!("sim-video-{serial}")),
                kind: TrackKind::Video,
                label: "Simulated Camera".to_string(),
            });
        }

        let mut ledger = self.ledger.lock();
        ledger.acquisitions += 1;
        for track in &tracks {
            ledger.live.insert(
                track.id.clone(),
                TrackRecord {
                    kind: track.kind,
                    enabled: true,
                },
            );
        }

        CaptureStream::new(format!("sim-stream-{serial}"), tracks)
    }
}

#[async_trait]
impl CaptureDevice for SimulatedCaptureDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<CaptureStream, DeviceError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if constraints.is_empty() {
            return Err(DeviceError::Failed(
                "at least one of audio or video must be requested".to_string(),
            ));
        }

        let outcome = *self.outcome.lock();
        match outcome {
            SimulatedOutcome::Grant => Ok(self.fabricate(constraints)),
            SimulatedOutcome::Deny => Err(DeviceError::PermissionDenied(
                "access to camera and microphone was refused".to_string(),
            )),
            SimulatedOutcome::Unavailable => Err(DeviceError::Unavailable(
                "no camera or microphone is attached".to_string(),
            )),
        }
    }

    fn set_track_enabled(&self, track: &MediaTrack, enabled: bool) {
        let mut ledger = self.ledger.lock();
        match ledger.live.get_mut(&track.id) {
            Some(record) => {
                record.enabled = enabled;
                ledger.enable_propagations += 1;
            }
            None => tracing::warn!(track = %track.id, "Enable on a track that is not live"),
        }
    }

    fn release_track(&self, track: &MediaTrack) {
        let mut ledger = self.ledger.lock();
        if ledger.live.remove(&track.id).is_some() {
            ledger.released += 1;
        } else {
            tracing::warn!(track = %track.id, "Release of a track that is not live");
        }
    }
}
