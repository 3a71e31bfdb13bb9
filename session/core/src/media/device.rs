//! Capture Device Traits
//!
//! The platform seam for live capture. A [`CaptureDevice`] hands out
//! [`CaptureStream`]s and is told when individual tracks are enabled,
//! disabled, or released. The controller never looks behind this trait; it
//! only cares about success, failure and handle semantics.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of media carried by a track
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    /// Microphone
    Audio,
    /// Camera
    Video,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// Which track kinds to ask the device for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    /// Request a microphone track
    pub audio: bool,
    /// Request a camera track
    pub video: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

impl CaptureConstraints {
    /// Camera only
    #[must_use]
    pub fn video_only() -> Self {
        Self {
            audio: false,
            video: true,
        }
    }

    /// Whether tracks of `kind` are requested
    #[must_use]
    pub fn requests(&self, kind: TrackKind) -> bool {
        match kind {
            TrackKind::Audio => self.audio,
            TrackKind::Video => self.video,
        }
    }

    /// Whether anything at all is requested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.audio && !self.video
    }
}

/// Track identifier, unique per device
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub String);

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One media channel inside a capture stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaTrack {
    /// Track identifier
    pub id: TrackId,
    /// Audio or video
    pub kind: TrackKind,
    /// Device label (e.g. "FaceTime HD Camera")
    pub label: String,
}

/// A live capture resource
///
/// Not `Clone`: exactly one owner holds the stream until it is consumed by
/// [`CaptureStream::release`].
#[derive(Debug)]
pub struct CaptureStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl CaptureStream {
    /// Wrap tracks handed out by a device
    pub fn new(id: impl Into<String>, tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    /// Stream identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All tracks
    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Tracks of one kind
    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(move |t| t.kind == kind)
    }

    /// Whether the stream carries at least one track of `kind`
    pub fn has_kind(&self, kind: TrackKind) -> bool {
        self.tracks_of(kind).next().is_some()
    }

    /// Stop every track and give the resource back to the device
    pub fn release<D: CaptureDevice + ?Sized>(self, device: &D) {
        for track in &self.tracks {
            device.release_track(track);
        }
        tracing::debug!(
            stream_id = %self.id,
            tracks = self.tracks.len(),
            device = device.name(),
            "Capture stream released"
        );
    }
}

/// A capture stream on its way from the device to its owner
///
/// Releases the stream when dropped, unless it was handed over with
/// [`HeldStream::into_inner`]. Whatever path discards it (a closed channel, a
/// dropped buffer, a stale result) gives the tracks back exactly once.
pub struct HeldStream<D: CaptureDevice + ?Sized> {
    stream: Option<CaptureStream>,
    device: Arc<D>,
}

impl<D: CaptureDevice + ?Sized> HeldStream<D> {
    /// Guard `stream`, releasing it to `device` on drop
    pub fn new(stream: CaptureStream, device: Arc<D>) -> Self {
        Self {
            stream: Some(stream),
            device,
        }
    }

    /// The guarded stream
    pub fn stream(&self) -> Option<&CaptureStream> {
        self.stream.as_ref()
    }

    /// Disarm the guard; the caller now owns the release
    pub fn into_inner(mut self) -> Option<CaptureStream> {
        self.stream.take()
    }
}

impl<D: CaptureDevice + ?Sized> Drop for HeldStream<D> {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.release(self.device.as_ref());
        }
    }
}

impl<D: CaptureDevice + ?Sized> std::fmt::Debug for HeldStream<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeldStream")
            .field("stream", &self.stream)
            .field("device", &self.device.name())
            .finish()
    }
}

/// Capture acquisition failures
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceError {
    /// The user or platform refused access
    #[error("Camera/microphone permission denied: {0}")]
    PermissionDenied(String),

    /// No matching device is present
    #[error("No capture device available: {0}")]
    Unavailable(String),

    /// Anything else the platform reported
    #[error("Capture failed: {0}")]
    Failed(String),
}

impl DeviceError {
    /// Failure category
    #[must_use]
    pub fn kind(&self) -> AcquisitionErrorKind {
        match self {
            Self::PermissionDenied(_) => AcquisitionErrorKind::Denied,
            Self::Unavailable(_) => AcquisitionErrorKind::Unavailable,
            Self::Failed(_) => AcquisitionErrorKind::Failed,
        }
    }
}

/// Failure category surfaced to the user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionErrorKind {
    /// Permission refused
    Denied,
    /// No device present
    Unavailable,
    /// Other platform failure
    Failed,
}

/// Platform capture collaborator
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Device name for logging and preview
    fn name(&self) -> &str;

    /// Request a capture stream matching `constraints`
    async fn acquire(&self, constraints: &CaptureConstraints)
        -> Result<CaptureStream, DeviceError>;

    /// Propagate an enabled flag to one track
    fn set_track_enabled(&self, track: &MediaTrack, enabled: bool);

    /// Stop one track
    fn release_track(&self, track: &MediaTrack);
}
