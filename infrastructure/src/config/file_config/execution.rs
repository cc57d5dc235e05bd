//! Execution configuration from TOML (`[execution]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stepwise_application::{DuplicatePlanPolicy, ExecutionParams, StepFailurePolicy};

/// Raw execution configuration
///
/// Durations are plain integers so they read naturally in TOML and
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    pub max_iterations: usize,
    pub generation_timeout_secs: u64,
    pub iteration_delay_ms: u64,
    /// `ignore` or `fail`
    pub duplicate_plan: String,
    /// `abort_task` or `continue`
    pub on_step_failure: String,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            max_iterations: params.max_iterations,
            generation_timeout_secs: params.generation_timeout.as_secs(),
            iteration_delay_ms: params.iteration_delay.as_millis() as u64,
            duplicate_plan: params.duplicate_plan.as_str().to_string(),
            on_step_failure: params.on_step_failure.as_str().to_string(),
        }
    }
}

impl FileExecutionConfig {
    /// Convert to application-level [`ExecutionParams`].
    pub fn to_execution_params(&self) -> Result<ExecutionParams, ConfigValidationError> {
        if self.max_iterations == 0 {
            return Err(ConfigValidationError::InvalidMaxIterations);
        }
        if self.generation_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        Ok(ExecutionParams::default()
            .with_max_iterations(self.max_iterations)
            .with_generation_timeout(Duration::from_secs(self.generation_timeout_secs))
            .with_iteration_delay(Duration::from_millis(self.iteration_delay_ms))
            .with_duplicate_plan(self.parse_duplicate_plan()?)
            .with_on_step_failure(self.parse_on_step_failure()?))
    }

    fn parse_duplicate_plan(&self) -> Result<DuplicatePlanPolicy, ConfigValidationError> {
        self.duplicate_plan
            .parse()
            .map_err(|_| ConfigValidationError::UnknownPolicy {
                field: "execution.duplicate_plan",
                value: self.duplicate_plan.clone(),
            })
    }

    fn parse_on_step_failure(&self) -> Result<StepFailurePolicy, ConfigValidationError> {
        self.on_step_failure
            .parse()
            .map_err(|_| ConfigValidationError::UnknownPolicy {
                field: "execution.on_step_failure",
                value: self.on_step_failure.clone(),
            })
    }

    pub(super) fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        if self.max_iterations == 0 {
            issues.push(ConfigValidationError::InvalidMaxIterations);
        }
        if self.generation_timeout_secs == 0 {
            issues.push(ConfigValidationError::InvalidTimeout);
        }
        issues.extend(self.parse_duplicate_plan().err());
        issues.extend(self.parse_on_step_failure().err());
        issues
    }
}
