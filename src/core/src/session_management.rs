//! Session control: the state machine tying capture, annotation and
//! recording together.
//!
//! Re-exports:
//! - [`SessionController`]: serialises start/stop/record requests and owns
//!   every resource of the live session.
//! - [`Action`]: what a bound page control asks the controller to do.
//! - [`HostServices`]: the host backends a controller drives.
//!
//! Example (headless host):
//! ```ignore
//! use screenmark::configuration::Config;
//! use screenmark::session_management::{HostServices, SessionController, SessionStatus};
//!
//! let controller = SessionController::new(&Config::default(), services)?;
//! controller.start().await;
//! assert_eq!(controller.status(), SessionStatus::Sharing);
//! controller.stop().await;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Submodule for the resources owned by a live session.
pub mod active_session;
/// Submodule for binding page controls to controller actions.
pub mod controls;
/// Submodule for end-to-end sessions against the headless host.
#[cfg(test)]
pub mod integration_tests;
/// Submodule for session metadata.
pub mod session;
/// Submodule for the session controller implementation.
pub mod session_controller;

pub use active_session::ActiveSession;
pub use controls::Action;
pub use session::Session;
pub use session_controller::{HostServices, SessionController};

/// Observable status of the controller.
///
/// `Transitioning` is reported for as long as a start, stop or record toggle
/// is in flight, whatever the settled state underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Transitioning,
    Sharing,
    Recording,
}

impl SessionStatus {
    /// Whether a capture stream is held.
    pub fn is_live(&self) -> bool {
        matches!(self, SessionStatus::Sharing | SessionStatus::Recording)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Transitioning => "transitioning",
            SessionStatus::Sharing => "sharing",
            SessionStatus::Recording => "recording",
        };
        f.write_str(name)
    }
}
