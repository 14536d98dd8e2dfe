//! Execution status state machine
//!
//! Shared by tasks, pipeline stages, bulk operations, and pipelines:
//! - Safety: no backward transitions
//! - Liveness: every started unit ends in Completed or Failed
//! - Determinism: unique next state per event

use crate::errors::{NetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of any executable unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Created, not started
    Pending,

    /// Work in progress
    Running,

    /// Finished successfully (terminal)
    Completed,

    /// Finished with an error (terminal)
    Failed,
}

/// Events that trigger status transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Start,
    Succeed,
    Fail,
}

impl ExecutionStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }

    /// Attempt a transition
    ///
    /// Valid edges:
    /// 1. Pending → Running   (Start)
    /// 2. Running → Completed (Succeed)
    /// 3. Running → Failed    (Fail)
    ///
    /// Terminal states accept nothing.
    pub fn transition(&self, event: StatusEvent) -> Result<ExecutionStatus> {
        use ExecutionStatus::*;
        use StatusEvent::*;

        let next = match (self, event) {
            (Pending, Start) => Running,
            (Running, Succeed) => Completed,
            (Running, Fail) => Failed,
            (from, event) => {
                return Err(NetError::InvalidTransition {
                    from: from.to_string(),
                    to: format!("(via {:?})", event),
                    reason: format!("No valid transition from {} on {:?}", from, event),
                });
            }
        };

        Ok(next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert_eq!(
            ExecutionStatus::Pending.transition(StatusEvent::Start).unwrap(),
            ExecutionStatus::Running
        );
        assert_eq!(
            ExecutionStatus::Running.transition(StatusEvent::Succeed).unwrap(),
            ExecutionStatus::Completed
        );
        assert_eq!(
            ExecutionStatus::Running.transition(StatusEvent::Fail).unwrap(),
            ExecutionStatus::Failed
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(ExecutionStatus::Completed.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
    }

    #[test]
    fn test_no_backward_transitions() {
        for event in [StatusEvent::Start, StatusEvent::Succeed, StatusEvent::Fail] {
            assert!(ExecutionStatus::Completed.transition(event).is_err());
            assert!(ExecutionStatus::Failed.transition(event).is_err());
        }
        assert!(ExecutionStatus::Running.transition(StatusEvent::Start).is_err());
    }

    #[test]
    fn test_pending_cannot_finish_without_start() {
        assert!(ExecutionStatus::Pending.transition(StatusEvent::Succeed).is_err());
        assert!(ExecutionStatus::Pending.transition(StatusEvent::Fail).is_err());
    }

    #[test]
    fn test_serialized_lowercase() {
        let json = serde_json::to_string(&ExecutionStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
