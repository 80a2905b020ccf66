use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use uuid::Uuid;

use crate::capture::{
    CaptureConstraints, CaptureService, MediaStream, MediaTrack, TrackKind, TrackState,
};
use crate::error_handling::types::CaptureError;

#[derive(Debug)]
pub struct SyntheticTrack {
    id: String,
    kind: TrackKind,
    state: Cell<TrackState>,
    stop_calls: Cell<usize>,
}

impl SyntheticTrack {
    fn new(id: String, kind: TrackKind) -> Self {
        Self {
            id,
            kind,
            state: Cell::new(TrackState::Live),
            stop_calls: Cell::new(0),
        }
    }

    /// How many times the core asked this track to stop.
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.get()
    }

    /// Ends the track from the host side, as when the user withdraws the
    /// capture through the platform's own controls.
    pub fn end(&self) {
        self.state.set(TrackState::Ended);
    }
}

impl MediaTrack for SyntheticTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn state(&self) -> TrackState {
        self.state.get()
    }

    fn stop(&self) {
        self.stop_calls.set(self.stop_calls.get() + 1);
        self.state.set(TrackState::Ended);
    }
}

pub struct SyntheticStream {
    id: String,
    tracks: Vec<Rc<SyntheticTrack>>,
}

impl MediaStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> Vec<Rc<dyn MediaTrack>> {
        self.tracks
            .iter()
            .map(|track| Rc::clone(track) as Rc<dyn MediaTrack>)
            .collect()
    }
}

struct CaptureInner {
    track_count: usize,
    latency: Duration,
    requests: Cell<usize>,
    next_failure: RefCell<Option<CaptureError>>,
    issued: RefCell<Vec<Rc<SyntheticTrack>>>,
    last_constraints: Cell<Option<CaptureConstraints>>,
}

/// Capture service producing video-only streams of `track_count` tracks.
///
/// Clones share their state, so a test can keep a clone after handing one
/// to the controller.
#[derive(Clone)]
pub struct SyntheticCapture {
    inner: Rc<CaptureInner>,
}

impl SyntheticCapture {
    pub fn new(track_count: usize) -> Self {
        Self::with_latency(track_count, Duration::ZERO)
    }

    /// Each request resolves after `latency` on the tokio clock. A zero
    /// latency still yields once, as a host round-trip would.
    pub fn with_latency(track_count: usize, latency: Duration) -> Self {
        Self {
            inner: Rc::new(CaptureInner {
                track_count,
                latency,
                requests: Cell::new(0),
                next_failure: RefCell::new(None),
                issued: RefCell::new(Vec::new()),
                last_constraints: Cell::new(None),
            }),
        }
    }

    /// The next request fails as if the user refused the permission prompt.
    pub fn deny_next(&self, reason: &str) {
        *self.inner.next_failure.borrow_mut() = Some(CaptureError::Denied(reason.to_string()));
    }

    /// The next request fails as if no display were available.
    pub fn unavailable_next(&self, reason: &str) {
        *self.inner.next_failure.borrow_mut() = Some(CaptureError::Unavailable(reason.to_string()));
    }

    pub fn requests(&self) -> usize {
        self.inner.requests.get()
    }

    pub fn last_constraints(&self) -> Option<CaptureConstraints> {
        self.inner.last_constraints.get()
    }

    /// Every track handed out so far, oldest first.
    pub fn issued_tracks(&self) -> Vec<Rc<SyntheticTrack>> {
        self.inner.issued.borrow().clone()
    }

    /// Ends every issued track from the host side.
    pub fn end_all(&self) {
        for track in self.inner.issued.borrow().iter() {
            track.end();
        }
    }
}

#[async_trait(?Send)]
impl CaptureService for SyntheticCapture {
    async fn request_stream(
        &self,
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn MediaStream>, CaptureError> {
        let inner = &self.inner;
        inner.requests.set(inner.requests.get() + 1);
        inner.last_constraints.set(Some(constraints));

        if inner.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(inner.latency).await;
        }

        let failure = inner.next_failure.borrow_mut().take();
        if let Some(err) = failure {
            debug!("Synthetic capture request failed: {}", err);
            return Err(err);
        }
        if !constraints.video {
            return Err(CaptureError::Unavailable("only video capture is supported".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let tracks: Vec<Rc<SyntheticTrack>> = (0..inner.track_count)
            .map(|i| Rc::new(SyntheticTrack::new(format!("{}-video-{}", id, i), TrackKind::Video)))
            .collect();
        inner.issued.borrow_mut().extend(tracks.iter().cloned());
        debug!("Synthetic capture issued stream {} with {} track(s)", id, tracks.len());
        Ok(Box::new(SyntheticStream { id, tracks }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn streams_are_video_only_with_live_tracks() {
        let capture = SyntheticCapture::new(2);
        let stream = capture
            .request_stream(CaptureConstraints::default())
            .await
            .unwrap();
        assert!(stream.is_active());
        assert!(stream.tracks().iter().all(|t| t.kind() == TrackKind::Video));
        assert_eq!(capture.requests(), 1);
        assert_eq!(capture.last_constraints(), Some(CaptureConstraints::default()));

        capture.end_all();
        assert!(!stream.is_active());
        assert!(capture.issued_tracks().iter().all(|t| t.stop_calls() == 0));
    }

    #[tokio::test]
    async fn failure_applies_to_one_request_only() {
        let capture = SyntheticCapture::new(1);
        capture.unavailable_next("no display");
        assert!(capture.request_stream(CaptureConstraints::default()).await.is_err());
        assert!(capture.request_stream(CaptureConstraints::default()).await.is_ok());
        assert_eq!(capture.requests(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn boxed_service_resolves_after_its_latency() {
        let capture = SyntheticCapture::with_latency(1, Duration::from_millis(200));
        let service: Box<dyn CaptureService> = Box::new(capture.clone());
        let started = tokio::time::Instant::now();

        let stream = service.request_stream(CaptureConstraints::default()).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(stream.tracks().len(), 1);
        assert_eq!(capture.requests(), 1);
    }
}
