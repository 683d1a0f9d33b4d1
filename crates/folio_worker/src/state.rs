//! Worker lifecycle.

use std::fmt;

/// Where a [`crate::GenerationWorker`] is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Created, nothing written yet.
    Idle,
    /// Writing the manifest and clearing the output directory.
    Preparing,
    /// The engine process is running.
    Dispatched,
    /// The engine exited successfully.
    Completed,
    /// Preparation or the engine failed, or the run was cancelled.
    Failed,
}

impl WorkerState {
    /// Returns `true` if moving to `next` is allowed.
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Idle, Preparing)
                | (Preparing, Dispatched)
                | (Preparing, Failed)
                | (Dispatched, Completed)
                | (Dispatched, Failed)
        )
    }

    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkerState::Completed | WorkerState::Failed)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Idle => "idle",
            WorkerState::Preparing => "preparing",
            WorkerState::Dispatched => "dispatched",
            WorkerState::Completed => "completed",
            WorkerState::Failed => "failed",
        };
        f.write_str(s)
    }
}
