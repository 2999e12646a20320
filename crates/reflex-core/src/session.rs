use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::{Millis, elapsed_secs};

/// Opaque session identifier issued by the results service. Never generated
/// or validated on the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One timed play-through. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub session_id: SessionId,
    pub start_time: Millis,
    pub duration_secs: f64,
}

impl GameSession {
    pub fn new(session_id: SessionId, start_time: Millis, duration_secs: f64) -> Self {
        Self {
            session_id,
            start_time,
            duration_secs,
        }
    }

    pub fn elapsed_secs(&self, now: Millis) -> f64 {
        elapsed_secs(self.start_time, now)
    }

    pub fn remaining_secs(&self, now: Millis) -> f64 {
        (self.duration_secs - self.elapsed_secs(now)).max(0.0)
    }
}

/// Session lifecycle. `Finished` is terminal; there is no pause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Running,
    Finished,
}
