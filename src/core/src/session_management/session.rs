use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::listener_registry::ScopeToken;

/// Metadata of one capture lifecycle, from a successful start to its stop.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    #[serde(skip)]
    pub scope: ScopeToken,
    pub start_time: DateTime<Utc>,
    /// Recordings completed within this session.
    pub recordings: u32,
    /// Whether the drawing overlay could be attached.
    pub annotations: bool,
}

impl Session {
    pub fn new(scope: ScopeToken, annotations: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope,
            start_time: Utc::now(),
            recordings: 0,
            annotations,
        }
    }
}
