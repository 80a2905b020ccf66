//! Live capture acquisition and release.
//!
//! Re-exports:
//! - [`CaptureResource`]: owns the stream of one session and stops its tracks
//!   exactly once.
//! - [`CaptureService`], [`MediaStream`], [`MediaTrack`]: the host contract.

/// Submodule for the owned capture stream of a session.
pub mod capture_resource;
/// Submodule for capture constraints and the host stream traits.
pub mod types;

pub use capture_resource::CaptureResource;
pub use types::{
    CaptureConstraints, CaptureService, CursorVisibility, MediaStream, MediaTrack,
    TrackKind, TrackState,
};
