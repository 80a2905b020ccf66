//! Headless host backends.
//!
//! These implement the host contracts without a browser or a display: a
//! synthetic capture service whose tracks can be inspected, a recorder that
//! emits fragments on demand or on a timer, and an in-memory document that
//! counts listeners per element. The demo binary and the test-suite drive the
//! session controller through them.

/// Submodule for the in-memory page with listener snapshots.
pub mod headless_document;
/// Submodule for the synthetic capture service and its tracks.
pub mod synthetic_capture;
/// Submodule for the manual and timer-driven recorders.
pub mod synthetic_recorder;

pub use headless_document::HeadlessDocument;
pub use synthetic_capture::{SyntheticCapture, SyntheticStream, SyntheticTrack};
pub use synthetic_recorder::{RecorderHandle, SyntheticRecorder, SyntheticRecorderService};
