//! Application layer for stepwise
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{DuplicatePlanPolicy, ExecutionParams, StepFailurePolicy};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    model_backend::{GatewayError, ModelBackend},
    progress::{NoProgress, ProgressObserver},
    tool_invoker::{InvokeError, ToolInvokerPort},
};
pub use use_cases::run_task::{RunTaskUseCase, TaskError, TaskOutcome, TaskReport};
pub use use_cases::task_runner::{PendingTask, RunnerError, TaskRunner};
