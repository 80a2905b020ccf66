use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use log::{debug, trace};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::capture::MediaStream;
use crate::error_handling::types::RecordingError;
use crate::recording::{HostRecorder, RecorderEvent, RecorderService, RecorderState};

/// EBML magic opening every WebM file; the first fragment of a synthetic
/// recording starts with it.
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Test-side view of a synthetic recorder.
#[derive(Clone)]
pub struct RecorderHandle {
    stream_id: String,
    events: UnboundedSender<RecorderEvent>,
    state: Rc<Cell<RecorderState>>,
}

impl RecorderHandle {
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn is_recording(&self) -> bool {
        self.state.get() == RecorderState::Recording
    }

    /// Emits a data-available event as the host encoder would.
    pub fn emit(&self, fragment: Vec<u8>) {
        if self.is_recording() {
            let _ = self.events.send(RecorderEvent::DataAvailable(fragment));
        }
    }
}

pub struct SyntheticRecorder {
    handle: RecorderHandle,
    tick: Option<(Duration, usize)>,
    final_fragment: Option<Vec<u8>>,
    ticker: Option<JoinHandle<()>>,
}

impl HostRecorder for SyntheticRecorder {
    fn start(&mut self) -> Result<(), RecordingError> {
        if self.handle.is_recording() {
            return Err(RecordingError::AlreadyRecording);
        }
        self.handle.state.set(RecorderState::Recording);

        if let Some((period, size)) = self.tick {
            let events = self.handle.events.clone();
            self.ticker = Some(tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.tick().await;
                let mut sequence: usize = 0;
                loop {
                    interval.tick().await;
                    let mut fragment = vec![(sequence % 251) as u8; size];
                    if sequence == 0 {
                        let n = EBML_MAGIC.len().min(fragment.len());
                        fragment[..n].copy_from_slice(&EBML_MAGIC[..n]);
                    }
                    trace!("Synthetic recorder emitting fragment {}", sequence);
                    if events.send(RecorderEvent::DataAvailable(fragment)).is_err() {
                        break;
                    }
                    sequence += 1;
                }
            }));
        }
        debug!("Synthetic recorder started on {}", self.handle.stream_id);
        Ok(())
    }

    fn stop(&mut self) {
        if !self.handle.is_recording() {
            return;
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if let Some(fragment) = self.final_fragment.take() {
            let _ = self.handle.events.send(RecorderEvent::DataAvailable(fragment));
        }
        self.handle.state.set(RecorderState::Inactive);
        let _ = self.handle.events.send(RecorderEvent::Stopped);
        debug!("Synthetic recorder stopped on {}", self.handle.stream_id);
    }

    fn state(&self) -> RecorderState {
        self.handle.state.get()
    }
}

impl Drop for SyntheticRecorder {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

struct ServiceInner {
    tick: Option<(Duration, usize)>,
    final_fragment: RefCell<Option<Vec<u8>>>,
    fail_next: Cell<bool>,
    created: RefCell<Vec<RecorderHandle>>,
}

/// Recorder factory for the headless host.
///
/// A manual service only emits what its `RecorderHandle` pushes; a ticking service emits
/// one fragment of `size` bytes per period while recording.
#[derive(Clone)]
pub struct SyntheticRecorderService {
    inner: Rc<ServiceInner>,
}

impl SyntheticRecorderService {
    pub fn manual() -> Self {
        Self::build(None)
    }

    pub fn ticking(period: Duration, size: usize) -> Self {
        Self::build(Some((period, size.max(1))))
    }

    fn build(tick: Option<(Duration, usize)>) -> Self {
        Self {
            inner: Rc::new(ServiceInner {
                tick,
                final_fragment: RefCell::new(None),
                fail_next: Cell::new(false),
                created: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Recorders created from now on flush `fragment` when stopped.
    pub fn with_final_fragment(self, fragment: Vec<u8>) -> Self {
        *self.inner.final_fragment.borrow_mut() = Some(fragment);
        self
    }

    /// The next `create` call fails.
    pub fn fail_next(&self) {
        self.inner.fail_next.set(true);
    }

    pub fn created(&self) -> usize {
        self.inner.created.borrow().len()
    }

    pub fn last_recorder(&self) -> Option<RecorderHandle> {
        self.inner.created.borrow().last().cloned()
    }
}

impl RecorderService for SyntheticRecorderService {
    fn create(
        &self,
        stream: &dyn MediaStream,
        events: UnboundedSender<RecorderEvent>,
    ) -> Result<Box<dyn HostRecorder>, RecordingError> {
        if self.inner.fail_next.replace(false) {
            return Err(RecordingError::RecorderUnavailable(
                "synthetic recorder refused to start".to_string(),
            ));
        }
        if !stream.is_active() {
            return Err(RecordingError::RecorderUnavailable(format!(
                "stream {} has no live track",
                stream.id()
            )));
        }
        let handle = RecorderHandle {
            stream_id: stream.id().to_string(),
            events,
            state: Rc::new(Cell::new(RecorderState::Inactive)),
        };
        self.inner.created.borrow_mut().push(handle.clone());
        Ok(Box::new(SyntheticRecorder {
            handle,
            tick: self.inner.tick,
            final_fragment: self.inner.final_fragment.borrow().clone(),
            ticker: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConstraints, CaptureService};
    use crate::host::SyntheticCapture;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn ticking_recorder_emits_until_stopped() {
        let capture = SyntheticCapture::new(1);
        let stream = capture
            .request_stream(CaptureConstraints::default())
            .await
            .unwrap();
        let service = SyntheticRecorderService::ticking(Duration::from_millis(100), 8);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut recorder = service.create(stream.as_ref(), tx).unwrap();
        recorder.start().unwrap();
        tokio::time::sleep(Duration::from_millis(350)).await;
        recorder.stop();

        let mut fragments = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                RecorderEvent::DataAvailable(f) => fragments.push(f),
                RecorderEvent::Stopped => break,
            }
        }
        assert_eq!(fragments.len(), 3);
        assert_eq!(&fragments[0][..4], &EBML_MAGIC);
        assert_eq!(recorder.state(), RecorderState::Inactive);
    }

    #[tokio::test]
    async fn recorder_requires_a_live_stream() {
        let capture = SyntheticCapture::new(1);
        let stream = capture
            .request_stream(CaptureConstraints::default())
            .await
            .unwrap();
        capture.end_all();
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = SyntheticRecorderService::manual()
            .create(stream.as_ref(), tx)
            .err()
            .unwrap();
        assert!(matches!(err, RecordingError::RecorderUnavailable(_)));
    }
}
