use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::types::*;
use crate::annotation::{AnnotationStyle, Color};
use crate::capture::{CaptureConstraints, CursorVisibility};
use crate::error_handling::types::ConfigError;
use crate::recording::RecordingSettings;

/// Environment variable overriding `recording.download_dir`.
pub const DOWNLOAD_DIR_ENV: &str = "SCREENMARK_DOWNLOAD_DIR";

const FALLBACK_MIME_TYPE: &str = "video/webm";

/// Runtime parameters of the capture-and-annotate session.
///
/// Every section and field has a default, so an empty file is a valid
/// configuration.
///
/// # Example
///
/// ```toml
/// [elements]
/// canvas = "overlay"
///
/// [annotation]
/// default_tool = "arrow"
/// default_color = "#ff0000"
///
/// [recording]
/// file_name = "demo.webm"
/// revoke_delay_ms = 250
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub elements: ElementConfig,
    pub annotation: AnnotationConfig,
    pub recording: RecordingConfig,
    pub capture: CaptureConfig,
}

impl Config {
    /// Reads, overrides from the environment and validates a TOML file.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        let mut config = Config::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Config, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(DOWNLOAD_DIR_ENV) {
            if !dir.is_empty() {
                debug!("Download dir overridden by {}: {}", DOWNLOAD_DIR_ENV, dir);
                self.recording.download_dir = PathBuf::from(dir);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.annotation;
        if !(a.line_width > 0.0 && a.line_width <= 64.0) {
            return Err(ConfigError::NotInRange(format!(
                "annotation.line_width must be in (0, 64], got {}",
                a.line_width
            )));
        }
        if !(0.0..=200.0).contains(&a.arrow_head_length) {
            return Err(ConfigError::NotInRange(format!(
                "annotation.arrow_head_length must be in [0, 200], got {}",
                a.arrow_head_length
            )));
        }
        if !(a.arrow_head_angle_deg > 0.0 && a.arrow_head_angle_deg < 90.0) {
            return Err(ConfigError::NotInRange(format!(
                "annotation.arrow_head_angle_deg must be in (0, 90), got {}",
                a.arrow_head_angle_deg
            )));
        }
        if !(a.highlight_alpha > 0.0 && a.highlight_alpha <= 1.0) {
            return Err(ConfigError::NotInRange(format!(
                "annotation.highlight_alpha must be in (0, 1], got {}",
                a.highlight_alpha
            )));
        }
        self.stroke_color()?;

        let name = &self.recording.file_name;
        if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
            return Err(ConfigError::BadFileName(format!(
                "recording.file_name '{}' must be a bare file name",
                name
            )));
        }
        if Path::new(name).extension().is_none() {
            return Err(ConfigError::BadFileName(format!(
                "recording.file_name '{}' has no extension",
                name
            )));
        }
        if self.recording.revoke_delay_ms > 60_000 {
            return Err(ConfigError::NotInRange(format!(
                "recording.revoke_delay_ms must be at most 60000, got {}",
                self.recording.revoke_delay_ms
            )));
        }
        if self.capture.cursor != CursorVisibility::Always {
            return Err(ConfigError::NotInRange(format!(
                "capture.cursor must be \"always\", got {:?}",
                self.capture.cursor
            )));
        }
        Ok(())
    }

    /// Checks that the download directory exists; used by frontends that
    /// write files.
    pub fn check_download_dir(&self) -> Result<(), ConfigError> {
        let dir = &self.recording.download_dir;
        if dir.is_dir() {
            Ok(())
        } else {
            Err(ConfigError::DirectoryDoesNotExist(dir.display().to_string()))
        }
    }

    pub fn stroke_color(&self) -> Result<Color, ConfigError> {
        self.annotation
            .default_color
            .parse::<Color>()
            .map_err(ConfigError::BadColor)
    }

    pub fn annotation_style(&self) -> AnnotationStyle {
        AnnotationStyle {
            line_width: self.annotation.line_width,
            arrow_head_length: self.annotation.arrow_head_length,
            arrow_head_angle: self.annotation.arrow_head_angle_deg.to_radians(),
            highlight_alpha: self.annotation.highlight_alpha,
        }
    }

    pub fn recording_settings(&self) -> RecordingSettings {
        let mime_type = self.recording.mime_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&self.recording.file_name)
                .first()
                .map(|mime| mime.essence_str().to_string())
                .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
        });
        RecordingSettings {
            file_name: self.recording.file_name.clone(),
            mime_type,
            revoke_delay: Duration::from_millis(self.recording.revoke_delay_ms),
        }
    }

    pub fn capture_constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            cursor: self.capture.cursor,
            ..CaptureConstraints::default()
        }
    }
}
