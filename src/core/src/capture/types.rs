//! Host capture contract.

use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error_handling::types::CaptureError;

/// Cursor rendering requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorVisibility {
    Always,
    Motion,
    Never,
}

/// Constraints passed to the host capture service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub video: bool,
    pub audio: bool,
    pub cursor: CursorVisibility,
}

impl Default for CaptureConstraints {
    /// Video only, no audio, cursor always rendered.
    fn default() -> Self {
        Self {
            video: true,
            audio: false,
            cursor: CursorVisibility::Always,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackState {
    Live,
    Ended,
}

/// One constituent track of a capture stream.
pub trait MediaTrack {
    fn id(&self) -> &str;

    fn kind(&self) -> TrackKind;

    fn state(&self) -> TrackState;

    /// Stops the track. Stopping an ended track has no effect.
    fn stop(&self);
}

/// A live stream handed out by the host.
pub trait MediaStream {
    fn id(&self) -> &str;

    fn tracks(&self) -> Vec<Rc<dyn MediaTrack>>;

    /// `true` while at least one track is live.
    fn is_active(&self) -> bool {
        self.tracks()
            .iter()
            .any(|track| track.state() == TrackState::Live)
    }
}

/// Host entry point producing capture streams.
///
/// Host calls run on a single thread, so the returned future is not `Send`.
#[async_trait(?Send)]
pub trait CaptureService {
    async fn request_stream(
        &self,
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn MediaStream>, CaptureError>;
}
