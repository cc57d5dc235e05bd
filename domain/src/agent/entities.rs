//! Task lifecycle entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the iteration controller for one task
///
/// ```text
/// AwaitingPlan ──plan──▶ Executing ──final_answer──▶ Completed
///      │                    │
///      └────────────────────┴──budget──▶ Exhausted
///                           └──error───▶ Failed
/// ```
///
/// A function call or final answer received before any plan moves the task
/// straight to `Executing` / `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    AwaitingPlan,
    Executing,
    Completed,
    Exhausted,
    Failed,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::AwaitingPlan => "awaiting_plan",
            RunPhase::Executing => "executing",
            RunPhase::Completed => "completed",
            RunPhase::Exhausted => "exhausted",
            RunPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunPhase::Completed | RunPhase::Exhausted | RunPhase::Failed
        )
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress status reported to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Started,
    PlanStored,
    StepCompleted { iteration: usize, tool: String },
    StepFailed { iteration: usize, tool: String },
    Answered,
    Exhausted,
    Failed { reason: String },
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Started => "started",
            TaskStatus::PlanStored => "plan_stored",
            TaskStatus::StepCompleted { .. } => "step_completed",
            TaskStatus::StepFailed { .. } => "step_failed",
            TaskStatus::Answered => "answered",
            TaskStatus::Exhausted => "exhausted",
            TaskStatus::Failed { .. } => "failed",
        }
    }

    /// Whether this is the last status a task reports.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            TaskStatus::Answered | TaskStatus::Exhausted | TaskStatus::Failed { .. }
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::StepCompleted { iteration, tool } => {
                write!(f, "step_completed (iteration {}: {})", iteration, tool)
            }
            TaskStatus::StepFailed { iteration, tool } => {
                write!(f, "step_failed (iteration {}: {})", iteration, tool)
            }
            TaskStatus::Failed { reason } => write!(f, "failed: {}", reason),
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_phase_default_and_terminal() {
        assert_eq!(RunPhase::default(), RunPhase::AwaitingPlan);
        assert!(!RunPhase::Executing.is_terminal());
        assert!(RunPhase::Exhausted.is_terminal());
        assert_eq!(RunPhase::AwaitingPlan.to_string(), "awaiting_plan");
    }

    #[test]
    fn test_task_status_display() {
        assert_eq!(TaskStatus::Started.to_string(), "started");
        assert_eq!(
            TaskStatus::StepCompleted {
                iteration: 2,
                tool: "add".to_string()
            }
            .to_string(),
            "step_completed (iteration 2: add)"
        );
        assert_eq!(
            TaskStatus::StepFailed {
                iteration: 3,
                tool: "divide".to_string()
            }
            .to_string(),
            "step_failed (iteration 3: divide)"
        );
        assert_eq!(
            TaskStatus::Failed {
                reason: "timeout".to_string()
            }
            .to_string(),
            "failed: timeout"
        );
    }

    #[test]
    fn test_task_status_is_final() {
        assert!(TaskStatus::Answered.is_final());
        assert!(TaskStatus::Exhausted.is_final());
        assert!(!TaskStatus::PlanStored.is_final());
    }
}
