//! Agent domain module
//!
//! The data side of the plan → execute → answer cycle: what a model response
//! may contain ([`protocol`]), what gets recorded ([`history`]), and the
//! lifecycle enums the controller and observers share ([`entities`]).

pub mod entities;
pub mod history;
pub mod protocol;
pub mod value_objects;

pub use entities::{RunPhase, TaskStatus};
pub use history::{ExecutionHistory, ExecutionStep, HistoryError, StepResult};
pub use protocol::{ModelResponse, ProtocolError, parse_response};
pub use value_objects::{FinalAnswer, FunctionCall, Plan, PlanStep, ReasoningTag};
