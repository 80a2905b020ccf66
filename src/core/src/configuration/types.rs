use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::annotation::Tool;
use crate::capture::CursorVisibility;
use crate::listener_registry::ElementId;

/// Ids of the page elements the controller binds to.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementConfig {
    pub start_button: String,
    pub stop_button: String,
    pub record_button: String,
    pub canvas: String,
    /// Tool selectors are looked up as `<prefix><tool>`, e.g. `tool-arrow`.
    pub tool_selector_prefix: String,
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            start_button: "startScreenShare".to_string(),
            stop_button: "stopScreenShare".to_string(),
            record_button: "toggleRecording".to_string(),
            canvas: "annotationCanvas".to_string(),
            tool_selector_prefix: "tool-".to_string(),
        }
    }
}

impl ElementConfig {
    pub fn tool_selector(&self, tool: Tool) -> ElementId {
        ElementId::new(format!("{}{}", self.tool_selector_prefix, tool))
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub default_tool: Tool,
    pub default_color: String,
    pub line_width: f64,
    pub arrow_head_length: f64,
    pub arrow_head_angle_deg: f64,
    pub highlight_alpha: f32,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            default_tool: Tool::Pen,
            default_color: "#000000".to_string(),
            line_width: 1.0,
            arrow_head_length: 10.0,
            arrow_head_angle_deg: 30.0,
            highlight_alpha: 0.3,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub file_name: String,
    /// Guessed from `file_name` when absent.
    pub mime_type: Option<String>,
    pub revoke_delay_ms: u64,
    pub download_dir: PathBuf,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            file_name: "screen-recording.webm".to_string(),
            mime_type: None,
            revoke_delay_ms: 100,
            download_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub cursor: CursorVisibility,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            cursor: CursorVisibility::Always,
        }
    }
}
