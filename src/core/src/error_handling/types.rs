use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    NotInRange(String),
    BadColor(String),
    BadFileName(String),
    DirectoryDoesNotExist(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
            ConfigError::BadColor(e) => write!(f, "Color error: {}", e),
            ConfigError::BadFileName(e) => write!(f, "File name error: {}", e),
            ConfigError::DirectoryDoesNotExist(e) => write!(f, "Directory error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failure to obtain a capture stream from the host.
///
/// Both variants are recoverable: the session returns to idle and the user
/// may retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The user or the operating system refused the capture permission.
    Denied(String),
    /// No capture surface is available (no display, host error, ...).
    Unavailable(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Denied(e) => write!(f, "Capture permission denied: {}", e),
            CaptureError::Unavailable(e) => write!(f, "Capture unavailable: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// A live binding already exists for this `(target, event)` pair.
    AlreadyBound { target: String, event: String },
    /// The scope was already released and cannot receive new bindings.
    ScopeClosed(u64),
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::AlreadyBound { target, event } => {
                write!(f, "Listener already bound for '{}' on '{}'", event, target)
            }
            ListenerError::ScopeClosed(scope) => write!(f, "Listener scope {} is closed", scope),
        }
    }
}

impl std::error::Error for ListenerError {}

#[derive(Debug)]
pub enum RecordingError {
    RecorderUnavailable(String),
    AlreadyRecording,
    UnknownObjectUrl(String),
    DownloadFailed(std::io::Error),
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::RecorderUnavailable(e) => write!(f, "Recorder unavailable: {}", e),
            RecordingError::AlreadyRecording => write!(f, "Recorder already active"),
            RecordingError::UnknownObjectUrl(e) => write!(f, "Unknown object URL: {}", e),
            RecordingError::DownloadFailed(e) => write!(f, "Download failed: {}", e),
        }
    }
}

impl std::error::Error for RecordingError {}

impl From<std::io::Error> for RecordingError {
    fn from(err: std::io::Error) -> Self {
        RecordingError::DownloadFailed(err)
    }
}

/// Errors raised inside a session transition.
///
/// These never reach UI callers: the controller logs them and converges on
/// an idle session.
#[derive(Debug)]
pub enum SessionError {
    CaptureError(CaptureError),
    ListenerError(ListenerError),
    RecordingError(RecordingError),
    NotSharing,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::CaptureError(e) => write!(f, "Capture error: {}", e),
            SessionError::ListenerError(e) => write!(f, "Listener error: {}", e),
            SessionError::RecordingError(e) => write!(f, "Recording error: {}", e),
            SessionError::NotSharing => write!(f, "No capture session is active"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        SessionError::CaptureError(err)
    }
}

impl From<ListenerError> for SessionError {
    fn from(err: ListenerError) -> Self {
        SessionError::ListenerError(err)
    }
}

impl From<RecordingError> for SessionError {
    fn from(err: RecordingError) -> Self {
        SessionError::RecordingError(err)
    }
}
