//! Live Media
//!
//! Acquisition, track toggling and teardown of a local audio/video capture.
//!
//! - [`device`]: the [`CaptureDevice`] platform seam and resource handles
//! - [`controller`]: the [`MediaSessionController`] state machine
//! - [`simulated`]: an in-process device used by the terminal surface and tests

pub mod controller;
pub mod device;
pub mod simulated;

pub use controller::{
    CloseReason, MediaError, MediaPhase, MediaSessionController, MediaSnapshot, MediaState,
    MediaUpdate, StreamPreview, TrackPreview,
};
pub use device::{
    AcquisitionErrorKind, CaptureConstraints, CaptureDevice, CaptureStream, DeviceError,
    HeldStream, MediaTrack, TrackId, TrackKind,
};
pub use simulated::{SimulatedCaptureDevice, SimulatedOutcome};
