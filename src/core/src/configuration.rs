/// Submodule for the top-level configuration and its validation.
pub mod config;
/// Submodule for the configuration sections.
pub mod types;

pub use config::Config;
pub use types::{AnnotationConfig, CaptureConfig, ElementConfig, RecordingConfig};
