//! Supervised process records.

use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle state of one supervised child.
///
/// A record only ever moves forward: `Starting -> Ready` (after a successful
/// probe), and any state `-> Terminated` or `-> Killed` exactly once. Records
/// are never resurrected; a restart creates a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Spawned, readiness not yet confirmed.
    Starting,
    /// At least one readiness probe succeeded.
    Ready,
    /// Exited on its own or after a graceful terminate.
    Terminated,
    /// Required a forced kill.
    Killed,
}

impl RecordState {
    /// Whether the process behind this record is done.
    pub fn is_stopped(&self) -> bool {
        matches!(self, RecordState::Terminated | RecordState::Killed)
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordState::Starting => write!(f, "starting"),
            RecordState::Ready => write!(f, "ready"),
            RecordState::Terminated => write!(f, "terminated"),
            RecordState::Killed => write!(f, "killed"),
        }
    }
}

/// One supervised child process.
///
/// Created when a launch is requested and mutated only by the supervisor.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    /// Monotonic identifier assigned by the supervisor.
    pub launch_id: u64,
    /// Label from the launch spec.
    pub id: String,
    pub pid: u32,
    /// Rendered executable + arguments, for logs.
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub state: RecordState,
    pub exit_code: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_states() {
        assert!(!RecordState::Starting.is_stopped());
        assert!(!RecordState::Ready.is_stopped());
        assert!(RecordState::Terminated.is_stopped());
        assert!(RecordState::Killed.is_stopped());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RecordState::Starting.to_string(), "starting");
        assert_eq!(RecordState::Killed.to_string(), "killed");
    }
}
