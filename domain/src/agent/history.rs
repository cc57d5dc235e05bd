//! Execution history
//!
//! The audit trail of one task: the user's query, the plan (set at most
//! once), every executed step in iteration order, and the final answer (set
//! at most once, after which nothing more may be appended). A fresh history
//! is created for every task and is exclusively owned by the controller
//! running it.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::value_objects::{FinalAnswer, Plan, ReasoningTag};
use crate::tool::value_objects::ToolOutput;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("A plan is already stored for this task")]
    PlanAlreadySet,

    #[error("The task already has a final answer")]
    AlreadyFinalized,

    #[error("Step for iteration {got} appended after iteration {last}")]
    OutOfOrder { last: usize, got: usize },
}

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepResult {
    Output(ToolOutput),
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<ToolOutput>,
    },
}

impl StepResult {
    pub fn error(message: impl Into<String>) -> Self {
        StepResult::Error {
            error: message.into(),
            output: None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            StepResult::Error { error, .. } => Some(error),
            StepResult::Output(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StepResult::Error { .. })
    }

    pub fn output(&self) -> Option<&ToolOutput> {
        match self {
            StepResult::Output(output) => Some(output),
            StepResult::Error { output, .. } => output.as_ref(),
        }
    }
}

/// One executed function call. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionStep {
    /// 1-based controller iteration that produced this step
    pub iteration: usize,
    pub tool_name: String,
    pub raw_parameters: Map<String, Value>,
    pub coerced_arguments: Map<String, Value>,
    pub reasoning_tag: ReasoningTag,
    pub reasoning: String,
    pub result: StepResult,
    /// Unix timestamp in milliseconds
    pub timestamp_ms: u64,
}

/// Append-only record of a task run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionHistory {
    user_query: String,
    #[serde(rename = "execution_plan")]
    plan: Option<Plan>,
    #[serde(rename = "executed_steps")]
    steps: Vec<ExecutionStep>,
    final_answer: Option<FinalAnswer>,
}

impl ExecutionHistory {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            plan: None,
            steps: Vec::new(),
            final_answer: None,
        }
    }

    pub fn user_query(&self) -> &str {
        &self.user_query
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn steps(&self) -> &[ExecutionStep] {
        &self.steps
    }

    pub fn last_step(&self) -> Option<&ExecutionStep> {
        self.steps.last()
    }

    pub fn final_answer(&self) -> Option<&FinalAnswer> {
        self.final_answer.as_ref()
    }

    pub fn has_plan(&self) -> bool {
        self.plan.is_some()
    }

    pub fn is_finalized(&self) -> bool {
        self.final_answer.is_some()
    }

    /// Store the plan. A stored plan is never overwritten.
    pub fn set_plan(&mut self, plan: Plan) -> Result<(), HistoryError> {
        if self.is_finalized() {
            return Err(HistoryError::AlreadyFinalized);
        }
        if self.plan.is_some() {
            return Err(HistoryError::PlanAlreadySet);
        }
        self.plan = Some(plan);
        Ok(())
    }

    /// Append an executed step.
    pub fn append_step(&mut self, step: ExecutionStep) -> Result<(), HistoryError> {
        if self.is_finalized() {
            return Err(HistoryError::AlreadyFinalized);
        }
        if let Some(last) = self.steps.last()
            && step.iteration < last.iteration
        {
            return Err(HistoryError::OutOfOrder {
                last: last.iteration,
                got: step.iteration,
            });
        }
        self.steps.push(step);
        Ok(())
    }

    /// Store the final answer. Terminal: no steps may follow.
    pub fn finalize(&mut self, answer: FinalAnswer) -> Result<(), HistoryError> {
        if self.is_finalized() {
            return Err(HistoryError::AlreadyFinalized);
        }
        self.final_answer = Some(answer);
        Ok(())
    }

    /// Pretty JSON view embedded in the prompt.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Current Unix time in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
