use std::cell::RefCell;

use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::capture::MediaStream;
use crate::error_handling::types::RecordingError;

use super::types::{
    DownloadReceipt, DownloadTarget, HostRecorder, RecordedChunks, RecorderEvent, RecorderService,
    RecorderState, RecordingSettings,
};

/// Result of stopping a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingOutcome {
    /// Fragments collected before assembly.
    pub chunk_count: usize,
    /// The delivered artifact, absent when nothing was recorded.
    pub download: Option<DownloadReceipt>,
}

/// One recording of the session's capture stream.
///
/// The sink owns the host recorder and the [`RecordedChunks`] buffer. It is
/// created by [`RecordingSink::start`] and consumed logically by
/// [`RecordingSink::stop`]; dropping an active sink stops its recorder so an
/// encoder never outlives the capture it reads from.
pub struct RecordingSink {
    recorder: Box<dyn HostRecorder>,
    events: UnboundedReceiver<RecorderEvent>,
    chunks: RecordedChunks,
    settings: RecordingSettings,
    started_at: DateTime<Utc>,
    finished: bool,
}

impl RecordingSink {
    /// Creates a recorder bound to `stream` and starts it with an empty buffer.
    pub fn start(
        service: &dyn RecorderService,
        stream: &dyn MediaStream,
        settings: RecordingSettings,
    ) -> Result<Self, RecordingError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut recorder = service.create(stream, tx)?;
        recorder.start()?;
        info!("Recording started on stream {}", stream.id());
        Ok(Self {
            recorder,
            events: rx,
            chunks: RecordedChunks::new(),
            settings,
            started_at: Utc::now(),
            finished: false,
        })
    }

    pub fn is_active(&self) -> bool {
        !self.finished && self.recorder.state() == RecorderState::Recording
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Fragments buffered so far, including any already emitted by the host.
    pub fn chunk_count(&mut self) -> usize {
        self.drain_pending();
        self.chunks.len()
    }

    /// Stops the recorder, waits for its final fragments and publishes the
    /// assembled artifact through `downloads`.
    ///
    /// The transient URL is revoked after the configured delay. Stopping a
    /// sink that already finished does nothing.
    pub async fn stop(
        &mut self,
        downloads: &RefCell<Box<dyn DownloadTarget>>,
    ) -> Result<RecordingOutcome, RecordingError> {
        if self.finished {
            return Ok(RecordingOutcome {
                chunk_count: 0,
                download: None,
            });
        }

        let mut stopped = self.drain_pending();
        if !stopped && self.recorder.state() == RecorderState::Recording {
            debug!("Requesting recorder stop");
            self.recorder.stop();
            while !stopped {
                match self.events.recv().await {
                    Some(event) => stopped = self.ingest(event),
                    None => {
                        warn!("Recorder dropped its event channel before signalling stop");
                        stopped = true;
                    }
                }
            }
        }
        self.finished = true;

        let chunks = std::mem::take(&mut self.chunks);
        let chunk_count = chunks.len();
        let elapsed = Utc::now() - self.started_at;
        info!(
            "Recording stopped after {}ms with {} fragment(s), {} bytes",
            elapsed.num_milliseconds(),
            chunk_count,
            chunks.total_bytes()
        );

        let Some(artifact) = chunks.assemble(&self.settings.file_name, &self.settings.mime_type) else {
            return Ok(RecordingOutcome {
                chunk_count,
                download: None,
            });
        };

        let bytes = artifact.bytes.len();
        let url = downloads.borrow_mut().create_object_url(artifact)?;
        let triggered = downloads
            .borrow_mut()
            .trigger_download(&url, &self.settings.file_name);
        let location = match triggered {
            Ok(location) => location,
            Err(e) => {
                warn!("Download of {} failed, revoking {}", self.settings.file_name, url);
                downloads.borrow_mut().revoke_object_url(&url);
                return Err(e);
            }
        };
        info!("Download of {} triggered via {}", self.settings.file_name, url);

        tokio::time::sleep(self.settings.revoke_delay).await;
        downloads.borrow_mut().revoke_object_url(&url);
        debug!("Revoked {}", url);

        Ok(RecordingOutcome {
            chunk_count,
            download: Some(DownloadReceipt {
                url,
                file_name: self.settings.file_name.clone(),
                mime_type: self.settings.mime_type.clone(),
                bytes,
                chunk_count,
                location,
            }),
        })
    }

    /// Applies every event already queued. Returns `true` once the recorder
    /// reported its stop.
    fn drain_pending(&mut self) -> bool {
        let mut stopped = false;
        while let Ok(event) = self.events.try_recv() {
            stopped |= self.ingest(event);
        }
        stopped
    }

    fn ingest(&mut self, event: RecorderEvent) -> bool {
        match event {
            RecorderEvent::DataAvailable(fragment) => {
                if self.finished {
                    return false;
                }
                if fragment.is_empty() {
                    trace!("Dropping empty recorder fragment");
                } else {
                    trace!("Buffered recorder fragment of {} bytes", fragment.len());
                }
                self.chunks = std::mem::take(&mut self.chunks).with_fragment(fragment);
                false
            }
            RecorderEvent::Stopped => true,
        }
    }
}

impl Drop for RecordingSink {
    fn drop(&mut self) {
        if self.recorder.state() == RecorderState::Recording {
            warn!("Recording sink dropped while active, stopping recorder");
            self.recorder.stop();
        }
    }
}
