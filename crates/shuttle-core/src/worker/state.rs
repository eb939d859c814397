//! Worker lifecycle state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`Worker`](super::Worker).
///
/// State transitions:
/// - Stopped -> Running (`start()`)
/// - Running -> StopRequested (`stop()`) -> Stopped (loop exited)
/// - Running -> Stopped (queue reported not started, or cancelled)
///
/// A worker runs at most once. After reaching Stopped from Running it stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerState {
    /// Not running. Initial state, and where every run ends.
    Stopped,

    /// The loop keeps pulling tasks.
    Running,

    /// `stop()` cleared the run flag; the loop leaves at its next check.
    StopRequested,
}

impl WorkerState {
    /// Should the loop start another iteration?
    pub fn keeps_running(self) -> bool {
        matches!(self, WorkerState::Running)
    }

    pub fn is_stopped(self) -> bool {
        matches!(self, WorkerState::Stopped)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Stopped => "stopped",
            WorkerState::Running => "running",
            WorkerState::StopRequested => "stop_requested",
        };
        f.write_str(s)
    }
}
