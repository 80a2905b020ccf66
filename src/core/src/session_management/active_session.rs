use crate::capture::CaptureResource;
use crate::session_management::session::Session;

/// A live session: its metadata and the capture it exclusively owns.
///
/// Dropping it releases the capture, so no exit path can leak a track.
pub struct ActiveSession {
    pub session: Session,
    pub capture: CaptureResource,
}
