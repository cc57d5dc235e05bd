//! Progress observer port
//!
//! Defines the interface for reporting task progress to the outside world.

use stepwise_domain::{ExecutionHistory, TaskStatus};

/// Callback for progress updates during a task
///
/// Called once when the task starts, after the plan is stored, after every
/// executed step, and once when the task ends. `history` is the task's
/// history as it stands at that moment.
///
/// Implementations live in the presentation layer and can display progress
/// in various ways (console, chat surface, etc.)
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, status: &TaskStatus, history: &ExecutionHistory);
}

/// No-op progress observer for when progress reporting is not needed
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _status: &TaskStatus, _history: &ExecutionHistory) {}
}
