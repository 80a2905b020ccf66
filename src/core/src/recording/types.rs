//! Recorder contract and recording value types.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::capture::MediaStream;
use crate::error_handling::types::RecordingError;

/// Notifications emitted by a host recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// An encoded fragment is ready. Empty fragments carry nothing and are dropped.
    DataAvailable(Vec<u8>),
    /// The recorder has fully stopped; no fragment follows.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecorderState {
    Inactive,
    Recording,
}

/// A host encoder bound to one stream.
pub trait HostRecorder {
    fn start(&mut self) -> Result<(), RecordingError>;

    /// Requests a stop. [`RecorderEvent::Stopped`] is delivered once the
    /// encoder has flushed its last fragment.
    fn stop(&mut self);

    fn state(&self) -> RecorderState;
}

/// Host factory for recorders.
pub trait RecorderService {
    fn create(
        &self,
        stream: &dyn MediaStream,
        events: UnboundedSender<RecorderEvent>,
    ) -> Result<Box<dyn HostRecorder>, RecordingError>;
}

/// Naming and lifetime of produced artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSettings {
    pub file_name: String,
    pub mime_type: String,
    /// How long the transient download reference stays valid.
    pub revoke_delay: Duration,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            file_name: "screen-recording.webm".to_string(),
            mime_type: "video/webm".to_string(),
            revoke_delay: Duration::from_millis(100),
        }
    }
}

/// Ordered fragments of one recording.
///
/// Appending consumes the value and returns the extended sequence; the
/// sequence is turned into an [`Artifact`] exactly once by
/// [`RecordedChunks::assemble`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedChunks {
    chunks: Vec<Vec<u8>>,
}

impl RecordedChunks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `fragment` unless it is empty.
    pub fn with_fragment(mut self, fragment: Vec<u8>) -> Self {
        if !fragment.is_empty() {
            self.chunks.push(fragment);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Concatenates the fragments into one artifact. An empty sequence
    /// produces nothing.
    pub fn assemble(self, file_name: &str, mime_type: &str) -> Option<Artifact> {
        if self.chunks.is_empty() {
            return None;
        }
        let chunk_count = self.chunks.len();
        Some(Artifact {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes: self.chunks.concat(),
            chunk_count,
            created_at: Utc::now(),
        })
    }
}

/// A finished recording ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Transient reference to an artifact held by the download target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectUrl(pub String);

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What was delivered for one finished recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadReceipt {
    pub url: ObjectUrl,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: usize,
    pub chunk_count: usize,
    pub location: Option<PathBuf>,
}

/// The page's synthetic download mechanism.
pub trait DownloadTarget {
    /// Exposes `artifact` behind a transient URL.
    fn create_object_url(&mut self, artifact: Artifact) -> Result<ObjectUrl, RecordingError>;

    /// Triggers the download of `url` as `file_name`. Returns where the file
    /// landed when the target knows it.
    fn trigger_download(
        &mut self,
        url: &ObjectUrl,
        file_name: &str,
    ) -> Result<Option<PathBuf>, RecordingError>;

    /// Releases the URL. Returns `false` when it was not live.
    fn revoke_object_url(&mut self, url: &ObjectUrl) -> bool;
}
