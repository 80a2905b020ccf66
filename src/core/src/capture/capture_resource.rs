use log::{debug, info};

use crate::error_handling::types::CaptureError;

use super::types::{CaptureConstraints, CaptureService, MediaStream, TrackState};

/// The capture stream of a single session.
///
/// Created by [`CaptureResource::acquire`]; [`CaptureResource::release`] stops
/// every track and forgets the stream, so later calls (and the final drop)
/// do nothing.
pub struct CaptureResource {
    stream: Option<Box<dyn MediaStream>>,
}

impl CaptureResource {
    /// Requests a stream from the host.
    pub async fn acquire(
        service: &dyn CaptureService,
        constraints: CaptureConstraints,
    ) -> Result<Self, CaptureError> {
        debug!("Requesting capture stream with {:?}", constraints);
        let stream = service.request_stream(constraints).await?;
        info!(
            "Acquired capture stream {} with {} track(s)",
            stream.id(),
            stream.tracks().len()
        );
        Ok(Self {
            stream: Some(stream),
        })
    }

    /// A resource holding no stream. Releasing it is a no-op.
    pub fn empty() -> Self {
        Self { stream: None }
    }

    pub fn stream(&self) -> Option<&dyn MediaStream> {
        self.stream.as_deref()
    }

    pub fn is_held(&self) -> bool {
        self.stream.is_some()
    }

    /// `true` while the host still delivers frames on at least one track.
    pub fn is_live(&self) -> bool {
        self.stream.as_ref().map_or(false, |stream| stream.is_active())
    }

    /// Stops every track of the held stream, including tracks that already
    /// ended, and drops the stream.
    ///
    /// Returns the number of tracks that were still live.
    pub fn release(&mut self) -> usize {
        let Some(stream) = self.stream.take() else {
            return 0;
        };

        let tracks = stream.tracks();
        let mut was_live = 0;
        for track in &tracks {
            if track.state() == TrackState::Live {
                was_live += 1;
            }
            track.stop();
        }
        info!(
            "Released capture stream {} ({} of {} track(s) were live)",
            stream.id(),
            was_live,
            tracks.len()
        );
        was_live
    }
}

impl Drop for CaptureResource {
    fn drop(&mut self) {
        self.release();
    }
}
