//! Type definitions for the RunTask use case.

use crate::ports::model_backend::GatewayError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::time::Duration;
use stepwise_domain::{
    CoercionError, DomainError, ExecutionHistory, FinalAnswer, HistoryError, ProtocolError,
    RunPhase, StepResult, TaskStatus,
};
use thiserror::Error;

/// Errors that end a task in the `Failed` state
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error("{0}")]
    InvalidQuery(#[from] DomainError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Coercion failed: {0}")]
    Coercion(#[from] CoercionError),

    #[error("Tool '{tool}' failed: {message}")]
    Invocation { tool: String, message: String },

    #[error("Model did not respond within {}s", .0.as_secs_f64())]
    GenerationTimeout(Duration),

    #[error("Model backend error: {0}")]
    Generation(#[from] GatewayError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Received a second plan while one is already stored")]
    DuplicatePlan,
}

impl TaskError {
    /// Short machine-readable category, used in reports and logs
    pub fn category(&self) -> &'static str {
        match self {
            TaskError::InvalidQuery(_) => "invalid_query",
            TaskError::Protocol(_) => "protocol",
            TaskError::ToolNotFound(_) => "tool_not_found",
            TaskError::Coercion(_) => "coercion",
            TaskError::Invocation { .. } => "invocation",
            TaskError::GenerationTimeout(_) => "generation_timeout",
            TaskError::Generation(_) => "generation",
            TaskError::History(_) => "history",
            TaskError::DuplicatePlan => "duplicate_plan",
        }
    }

    /// Whether this error came from a single function call.
    ///
    /// Step failures may be survived under `StepFailurePolicy::Continue`;
    /// every other error always ends the task.
    pub fn is_step_failure(&self) -> bool {
        matches!(
            self,
            TaskError::ToolNotFound(_) | TaskError::Coercion(_) | TaskError::Invocation { .. }
        )
    }
}

/// Terminal outcome of a task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Answered,
    Exhausted,
    Failed(TaskError),
}

impl TaskOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Answered => "answered",
            TaskOutcome::Exhausted => "exhausted",
            TaskOutcome::Failed(_) => "failed",
        }
    }

    pub fn phase(&self) -> RunPhase {
        match self {
            TaskOutcome::Answered => RunPhase::Completed,
            TaskOutcome::Exhausted => RunPhase::Exhausted,
            TaskOutcome::Failed(_) => RunPhase::Failed,
        }
    }

    /// The status reported to observers when the task ends
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Answered => TaskStatus::Answered,
            TaskOutcome::Exhausted => TaskStatus::Exhausted,
            TaskOutcome::Failed(e) => TaskStatus::Failed {
                reason: e.to_string(),
            },
        }
    }

    pub fn error(&self) -> Option<&TaskError> {
        match self {
            TaskOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Everything a caller needs to audit a finished task
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task_id: u64,
    pub outcome: TaskOutcome,
    pub history: ExecutionHistory,
    /// Number of model turns consumed
    pub iterations: usize,
    /// Raw text of the last model response, if any
    pub last_response: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl TaskReport {
    pub fn is_answered(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Answered)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Failed(_))
    }

    pub fn final_answer(&self) -> Option<&FinalAnswer> {
        self.history.final_answer()
    }

    /// JSON view of the whole report
    pub fn to_json(&self) -> Value {
        let error = self.outcome.error().map(|e| {
            json!({
                "category": e.category(),
                "message": e.to_string(),
            })
        });
        json!({
            "task_id": self.task_id,
            "outcome": self.outcome.as_str(),
            "error": error,
            "iterations": self.iterations,
            "started_at": self.started_at.to_rfc3339(),
            "elapsed_ms": self.elapsed.as_millis() as u64,
            "history": serde_json::to_value(&self.history).unwrap_or(Value::Null),
            "last_response": self.last_response,
        })
    }
}

/// Mutable state of one task, created fresh per run
pub(super) struct TaskRun {
    pub(super) task_id: u64,
    pub(super) iteration: usize,
    pub(super) last_response: Option<String>,
    pub(super) phase: RunPhase,
    pub(super) history: ExecutionHistory,
}

impl TaskRun {
    pub(super) fn new(task_id: u64, query: &str) -> Self {
        Self {
            task_id,
            iteration: 0,
            last_response: None,
            phase: RunPhase::AwaitingPlan,
            history: ExecutionHistory::new(query),
        }
    }
}

/// A function call that did not produce output
pub(super) struct CallFailure {
    pub(super) coerced: Map<String, Value>,
    pub(super) result: StepResult,
    pub(super) error: TaskError,
}

impl CallFailure {
    /// Failure before any argument was bound (lookup or coercion)
    pub(super) fn before_invoke(error: TaskError) -> Self {
        Self {
            coerced: Map::new(),
            result: StepResult::error(error.to_string()),
            error,
        }
    }
}

/// What the loop does after one iteration
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Flow {
    Continue,
    Answered,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_failures_are_classified() {
        assert!(TaskError::ToolNotFound("x".into()).is_step_failure());
        assert!(
            TaskError::Invocation {
                tool: "divide".into(),
                message: "division by zero".into()
            }
            .is_step_failure()
        );
        assert!(!TaskError::DuplicatePlan.is_step_failure());
        assert!(!TaskError::GenerationTimeout(Duration::from_secs(20)).is_step_failure());
    }

    #[test]
    fn test_timeout_message() {
        let err = TaskError::GenerationTimeout(Duration::from_secs(20));
        assert_eq!(err.to_string(), "Model did not respond within 20s");
        assert_eq!(err.category(), "generation_timeout");
    }

    #[test]
    fn test_outcome_status_and_phase() {
        assert_eq!(TaskOutcome::Answered.status(), TaskStatus::Answered);
        assert_eq!(TaskOutcome::Exhausted.phase(), RunPhase::Exhausted);
        let failed = TaskOutcome::Failed(TaskError::DuplicatePlan);
        assert_eq!(failed.phase(), RunPhase::Failed);
        assert_eq!(
            failed.status(),
            TaskStatus::Failed {
                reason: "Received a second plan while one is already stored".to_string()
            }
        );
    }

    #[test]
    fn test_report_json_shape() {
        let report = TaskReport {
            task_id: 3,
            outcome: TaskOutcome::Failed(TaskError::ToolNotFound("nope".into())),
            history: ExecutionHistory::new("q"),
            iterations: 2,
            last_response: Some("{}".into()),
            started_at: Utc::now(),
            elapsed: Duration::from_millis(1500),
        };
        let value = report.to_json();
        assert_eq!(value["outcome"], "failed");
        assert_eq!(value["error"]["category"], "tool_not_found");
        assert_eq!(value["iterations"], 2);
        assert_eq!(value["elapsed_ms"], 1500);
        assert_eq!(value["history"]["user_query"], "q");
        assert!(report.is_failed());
        assert!(!report.is_answered());
    }
}
