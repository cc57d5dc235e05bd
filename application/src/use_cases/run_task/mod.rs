//! Run Task use case
//!
//! The iteration controller: drives one query through the
//! plan → function call → final answer cycle.
//!
//! Each iteration renders the prompt (tool listing plus the current
//! [`ExecutionHistory`]), asks the model for exactly one response under the
//! generation timeout, and acts on it:
//!
//! | Response        | Effect                                                   |
//! |-----------------|----------------------------------------------------------|
//! | `plan`          | stored once; a later plan is ignored or fails the task   |
//! | `function_call` | lookup → coerce → invoke, recorded as an execution step  |
//! | `final_answer`  | stored, task ends `Answered`                             |
//!
//! Reaching `max_iterations` without an answer ends the task `Exhausted`.

mod types;

pub use types::{TaskError, TaskOutcome, TaskReport};

use types::{CallFailure, Flow, TaskRun};

use crate::config::{DuplicatePlanPolicy, ExecutionParams, StepFailurePolicy};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::model_backend::ModelBackend;
use crate::ports::progress::{NoProgress, ProgressObserver};
use crate::ports::tool_invoker::{InvokeError, ToolInvokerPort};
use chrono::Utc;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use stepwise_domain::{
    DomainError, ExecutionStep, FinalAnswer, FunctionCall, ModelResponse, Plan, RunPhase,
    StepResult, TaskPromptTemplate, TaskStatus, ToolOutput, coerce, current_timestamp_ms,
    parse_response, truncate,
};
use tracing::{debug, info, warn};

/// Use case for running one task to a terminal outcome
pub struct RunTaskUseCase<M: ModelBackend + 'static, T: ToolInvokerPort + 'static> {
    backend: Arc<M>,
    tool_invoker: Arc<T>,
    params: ExecutionParams,
    prompt: TaskPromptTemplate,
    conversation_logger: Arc<dyn ConversationLogger>,
    next_task_id: AtomicU64,
}

impl<M: ModelBackend + 'static, T: ToolInvokerPort + 'static> RunTaskUseCase<M, T> {
    pub fn new(backend: Arc<M>, tool_invoker: Arc<T>) -> Self {
        Self {
            backend,
            tool_invoker,
            params: ExecutionParams::default(),
            prompt: TaskPromptTemplate::default(),
            conversation_logger: Arc::new(NoConversationLogger),
            next_task_id: AtomicU64::new(1),
        }
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_prompt(mut self, prompt: TaskPromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn params(&self) -> &ExecutionParams {
        &self.params
    }

    /// Execute a task without progress reporting
    pub async fn execute(&self, query: &str) -> TaskReport {
        self.execute_with_progress(query, &NoProgress).await
    }

    /// Execute a task, reporting each status change to `progress`.
    ///
    /// The observer sees `Started` first and exactly one final status
    /// (`Answered`, `Exhausted` or `Failed`) last.
    pub async fn execute_with_progress(
        &self,
        query: &str,
        progress: &dyn ProgressObserver,
    ) -> TaskReport {
        let task_id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut run = TaskRun::new(task_id, query);

        info!("Task {} started: {}", task_id, truncate(query, 100));
        self.conversation_logger.log(ConversationEvent::for_task(
            "task_started",
            task_id,
            json!({
                "query": query,
                "model": self.backend.model_name(),
                "max_iterations": self.params.max_iterations,
            }),
        ));
        progress.on_progress(&TaskStatus::Started, &run.history);

        let outcome = match DomainError::check_query(query) {
            Ok(()) => self.drive(&mut run, progress).await,
            Err(e) => TaskOutcome::Failed(e.into()),
        };
        run.phase = outcome.phase();

        match &outcome {
            TaskOutcome::Answered => info!(
                "Task {} answered after {} iteration(s)",
                task_id, run.iteration
            ),
            TaskOutcome::Exhausted => warn!(
                "Task {} exhausted its budget of {} iteration(s) without an answer",
                task_id, self.params.max_iterations
            ),
            TaskOutcome::Failed(e) => warn!(
                "Task {} failed at iteration {} ({}): {}",
                task_id,
                run.iteration,
                e.category(),
                e
            ),
        }
        self.conversation_logger.log(ConversationEvent::for_task(
            "task_finished",
            task_id,
            json!({
                "outcome": outcome.as_str(),
                "phase": run.phase.as_str(),
                "iterations": run.iteration,
                "steps": run.history.steps().len(),
                "error": outcome.error().map(|e| e.to_string()),
            }),
        ));
        progress.on_progress(&outcome.status(), &run.history);

        TaskReport {
            task_id,
            outcome,
            history: run.history,
            iterations: run.iteration,
            last_response: run.last_response,
            started_at,
            elapsed: clock.elapsed(),
        }
    }

    async fn drive(&self, run: &mut TaskRun, progress: &dyn ProgressObserver) -> TaskOutcome {
        // Rendered once: the catalog does not change during a task.
        let tools_description = self.tool_invoker.catalog().describe_all();

        while run.iteration < self.params.max_iterations {
            if run.iteration > 0 && !self.params.iteration_delay.is_zero() {
                tokio::time::sleep(self.params.iteration_delay).await;
            }
            run.iteration += 1;
            debug!(
                "Task {} iteration {}/{} ({})",
                run.task_id, run.iteration, self.params.max_iterations, run.phase
            );

            match self.run_iteration(run, &tools_description, progress).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Answered) => return TaskOutcome::Answered,
                Err(e) => return TaskOutcome::Failed(e),
            }
        }
        TaskOutcome::Exhausted
    }

    async fn run_iteration(
        &self,
        run: &mut TaskRun,
        tools_description: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<Flow, TaskError> {
        let prompt = self.prompt.render(tools_description, &run.history);
        self.conversation_logger.log(ConversationEvent::for_task(
            "model_prompt",
            run.task_id,
            json!({ "iteration": run.iteration, "prompt": prompt }),
        ));

        let raw = self.generate(&prompt).await?;
        self.conversation_logger.log(ConversationEvent::for_task(
            "model_response",
            run.task_id,
            json!({ "iteration": run.iteration, "text": raw }),
        ));
        let parsed = parse_response(&raw);
        run.last_response = Some(raw);

        match parsed? {
            ModelResponse::Plan(plan) => self.handle_plan(run, plan, progress),
            ModelResponse::FunctionCall(call) => {
                self.handle_function_call(run, call, progress).await
            }
            ModelResponse::FinalAnswer(answer) => self.handle_final_answer(run, answer),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, TaskError> {
        let timeout = self.params.generation_timeout;
        match tokio::time::timeout(timeout, self.backend.generate(prompt)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TaskError::GenerationTimeout(timeout)),
        }
    }

    fn handle_plan(
        &self,
        run: &mut TaskRun,
        plan: Plan,
        progress: &dyn ProgressObserver,
    ) -> Result<Flow, TaskError> {
        if run.history.has_plan() {
            return match self.params.duplicate_plan {
                DuplicatePlanPolicy::Ignore => {
                    warn!(
                        "Task {}: model sent another plan at iteration {}; keeping the stored one",
                        run.task_id, run.iteration
                    );
                    self.conversation_logger.log(ConversationEvent::for_task(
                        "plan_ignored",
                        run.task_id,
                        json!({ "iteration": run.iteration, "steps": plan.len() }),
                    ));
                    Ok(Flow::Continue)
                }
                DuplicatePlanPolicy::Fail => Err(TaskError::DuplicatePlan),
            };
        }

        info!("Task {}: plan stored with {} step(s)", run.task_id, plan.len());
        self.conversation_logger.log(ConversationEvent::for_task(
            "plan_stored",
            run.task_id,
            json!({ "iteration": run.iteration, "plan": plan }),
        ));
        run.history.set_plan(plan)?;
        run.phase = RunPhase::Executing;
        progress.on_progress(&TaskStatus::PlanStored, &run.history);
        Ok(Flow::Continue)
    }

    async fn handle_function_call(
        &self,
        run: &mut TaskRun,
        call: FunctionCall,
        progress: &dyn ProgressObserver,
    ) -> Result<Flow, TaskError> {
        run.phase = RunPhase::Executing;

        if !call.reasoning_tag.is_known() {
            warn!(
                "Task {}: unrecognised reasoning tag '{}' for {}",
                run.task_id, call.reasoning_tag, call.name
            );
            self.conversation_logger.log(ConversationEvent::for_task(
                "reasoning_tag_flagged",
                run.task_id,
                json!({ "iteration": run.iteration, "tool": call.name, "tag": call.reasoning_tag }),
            ));
        }

        let (coerced, step_result, failure) = match self.execute_call(run, &call).await {
            Ok((coerced, output)) => (coerced, StepResult::Output(output), None),
            Err(failure) => (failure.coerced, failure.result, Some(failure.error)),
        };

        self.conversation_logger.log(ConversationEvent::for_task(
            "tool_result",
            run.task_id,
            json!({
                "iteration": run.iteration,
                "tool": call.name,
                "result": step_result,
            }),
        ));

        let tool = call.name.clone();
        run.history.append_step(ExecutionStep {
            iteration: run.iteration,
            tool_name: call.name,
            raw_parameters: call.parameters,
            coerced_arguments: coerced,
            reasoning_tag: call.reasoning_tag,
            reasoning: call.reasoning,
            result: step_result,
            timestamp_ms: current_timestamp_ms(),
        })?;

        let Some(error) = failure else {
            progress.on_progress(
                &TaskStatus::StepCompleted {
                    iteration: run.iteration,
                    tool,
                },
                &run.history,
            );
            return Ok(Flow::Continue);
        };

        progress.on_progress(
            &TaskStatus::StepFailed {
                iteration: run.iteration,
                tool,
            },
            &run.history,
        );
        match self.params.on_step_failure {
            StepFailurePolicy::Continue if error.is_step_failure() => {
                warn!(
                    "Task {}: step {} failed, continuing: {}",
                    run.task_id, run.iteration, error
                );
                Ok(Flow::Continue)
            }
            _ => Err(error),
        }
    }

    /// Resolve, coerce and invoke one call.
    ///
    /// On failure the step is still recorded, with whatever arguments were
    /// coerced before the failure.
    async fn execute_call(
        &self,
        run: &TaskRun,
        call: &FunctionCall,
    ) -> Result<(Map<String, Value>, ToolOutput), CallFailure> {
        let descriptor = self
            .tool_invoker
            .lookup(&call.name)
            .map_err(|_| CallFailure::before_invoke(TaskError::ToolNotFound(call.name.clone())))?;

        let coerced = coerce(&call.parameters, descriptor)
            .map_err(|e| CallFailure::before_invoke(e.into()))?;
        if let Some(expected) = descriptor.schema.parameters().map(|p| p.len())
            && call.parameters.len() > expected
        {
            debug!(
                "Task {}: ignoring {} extra parameter value(s) for {}",
                run.task_id,
                call.parameters.len() - expected,
                call.name
            );
        }

        let shown = truncate(&Value::Object(coerced.clone()).to_string(), 120);
        info!(
            "Task {} iteration {}: {} {}",
            run.task_id, run.iteration, call.name, shown
        );
        self.conversation_logger.log(ConversationEvent::for_task(
            "tool_call",
            run.task_id,
            json!({
                "iteration": run.iteration,
                "tool": call.name,
                "reasoning_tag": call.reasoning_tag,
                "arguments": coerced,
            }),
        ));

        match self.tool_invoker.invoke(&call.name, &coerced).await {
            Ok(output) => Ok((coerced, output)),
            Err(InvokeError::ToolNotFound(name)) => {
                let error = TaskError::ToolNotFound(name);
                Err(CallFailure {
                    result: StepResult::error(error.to_string()),
                    coerced,
                    error,
                })
            }
            Err(InvokeError::Execution {
                tool,
                message,
                output,
            }) => Err(CallFailure {
                coerced,
                result: StepResult::Error {
                    error: message.clone(),
                    output,
                },
                error: TaskError::Invocation { tool, message },
            }),
        }
    }

    fn handle_final_answer(
        &self,
        run: &mut TaskRun,
        answer: FinalAnswer,
    ) -> Result<Flow, TaskError> {
        self.conversation_logger.log(ConversationEvent::for_task(
            "final_answer",
            run.task_id,
            json!({
                "iteration": run.iteration,
                "result": answer.result,
                "summary": answer.summary,
            }),
        ));
        run.history.finalize(answer)?;
        run.phase = RunPhase::Completed;
        Ok(Flow::Answered)
    }
}
