//! Encoding of the capture stream into a downloadable artifact.
//!
//! Re-exports:
//! - [`RecordingSink`]: drives one host recorder, buffers its fragments and
//!   publishes the assembled artifact.
//! - [`FileDownloader`]: a [`DownloadTarget`] writing artifacts to disk.

/// Submodule for download targets, including the file downloader.
pub mod downloads;
/// Submodule for the recording sink implementation.
pub mod recording_sink;
/// Submodule for recorder events, chunks and receipts.
pub mod types;

pub use downloads::FileDownloader;
pub use recording_sink::{RecordingOutcome, RecordingSink};
pub use types::{
    Artifact, DownloadReceipt, DownloadTarget, HostRecorder, ObjectUrl, RecordedChunks,
    RecorderEvent, RecorderService, RecorderState, RecordingSettings,
};
