//! Execution parameters for the iteration controller.
//!
//! [`ExecutionParams`] groups the static parameters that control the loop in
//! [`RunTaskUseCase`](crate::use_cases::run_task::RunTaskUseCase).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What to do when the model sends a plan after one is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePlanPolicy {
    /// Keep the first plan, ignore the new one and continue
    #[default]
    Ignore,
    /// Fail the task
    Fail,
}

/// What to do when a single function call fails (unknown tool, coercion,
/// or the tool itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepFailurePolicy {
    /// Record the failed step and fail the whole task
    #[default]
    AbortTask,
    /// Record the failed step and let the model continue
    Continue,
}

impl DuplicatePlanPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePlanPolicy::Ignore => "ignore",
            DuplicatePlanPolicy::Fail => "fail",
        }
    }
}

impl StepFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepFailurePolicy::AbortTask => "abort_task",
            StepFailurePolicy::Continue => "continue",
        }
    }
}

impl fmt::Display for DuplicatePlanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StepFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicatePlanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(DuplicatePlanPolicy::Ignore),
            "fail" | "strict" => Ok(DuplicatePlanPolicy::Fail),
            other => Err(format!("unknown duplicate plan policy '{}'", other)),
        }
    }
}

impl FromStr for StepFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "abort" | "abort_task" => Ok(StepFailurePolicy::AbortTask),
            "continue" => Ok(StepFailurePolicy::Continue),
            other => Err(format!("unknown step failure policy '{}'", other)),
        }
    }
}

/// Execution loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Maximum number of model turns per task.
    pub max_iterations: usize,
    /// Time budget for a single model generation.
    pub generation_timeout: Duration,
    /// Pause between iterations. Cosmetic pacing only; may be zero.
    pub iteration_delay: Duration,
    pub duplicate_plan: DuplicatePlanPolicy,
    pub on_step_failure: StepFailurePolicy,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            generation_timeout: Duration::from_secs(20),
            iteration_delay: Duration::ZERO,
            duplicate_plan: DuplicatePlanPolicy::Ignore,
            on_step_failure: StepFailurePolicy::AbortTask,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_iteration_delay(mut self, delay: Duration) -> Self {
        self.iteration_delay = delay;
        self
    }

    pub fn with_duplicate_plan(mut self, policy: DuplicatePlanPolicy) -> Self {
        self.duplicate_plan = policy;
        self
    }

    pub fn with_on_step_failure(mut self, policy: StepFailurePolicy) -> Self {
        self.on_step_failure = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.max_iterations, 3);
        assert_eq!(params.generation_timeout, Duration::from_secs(20));
        assert!(params.iteration_delay.is_zero());
        assert_eq!(params.duplicate_plan, DuplicatePlanPolicy::Ignore);
        assert_eq!(params.on_step_failure, StepFailurePolicy::AbortTask);
    }

    #[test]
    fn test_builder() {
        let params = ExecutionParams::default()
            .with_max_iterations(10)
            .with_iteration_delay(Duration::from_millis(500))
            .with_duplicate_plan(DuplicatePlanPolicy::Fail)
            .with_on_step_failure(StepFailurePolicy::Continue);

        assert_eq!(params.max_iterations, 10);
        assert_eq!(params.iteration_delay, Duration::from_millis(500));
        assert_eq!(params.duplicate_plan, DuplicatePlanPolicy::Fail);
        assert_eq!(params.on_step_failure, StepFailurePolicy::Continue);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("strict".parse::<DuplicatePlanPolicy>(), Ok(DuplicatePlanPolicy::Fail));
        assert_eq!("Ignore".parse::<DuplicatePlanPolicy>(), Ok(DuplicatePlanPolicy::Ignore));
        assert_eq!("abort-task".parse::<StepFailurePolicy>(), Ok(StepFailurePolicy::AbortTask));
        assert_eq!("continue".parse::<StepFailurePolicy>(), Ok(StepFailurePolicy::Continue));
        assert!("retry".parse::<StepFailurePolicy>().is_err());
    }
}
