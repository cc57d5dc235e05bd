//! Domain layer for stepwise
//!
//! This crate contains the core logic of the tool-orchestration loop. It has
//! no dependencies on infrastructure or presentation concerns and performs
//! no I/O.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! - **Tool Catalog**: read-only registry of tool descriptors, rendered into every prompt
//! - **Coercion**: positional binding of a model's loosely-typed parameters to a typed schema
//! - **Tool Output**: the canonical shape every tool result is normalised into
//!
//! ## Agent
//!
//! - **Response Protocol**: each model turn is exactly one of plan, function call or final answer
//! - **Execution History**: append-only audit trail of one task

pub mod agent;
pub mod config;
pub mod core;
pub mod prompt;
pub mod tool;

// Re-export commonly used types
pub use agent::{
    entities::{RunPhase, TaskStatus},
    history::{ExecutionHistory, ExecutionStep, HistoryError, StepResult, current_timestamp_ms},
    protocol::{ModelResponse, ProtocolError, parse_response, strip_code_fence},
    value_objects::{FinalAnswer, FunctionCall, Plan, PlanStep, ReasoningTag},
};
pub use config::OutputFormat;
pub use core::{error::DomainError, string::truncate};
pub use prompt::TaskPromptTemplate;
pub use tool::{
    catalog::{CatalogError, ToolCatalog},
    coercion::{CoercedArguments, CoercionError, coerce},
    entities::{ParamType, ParameterSchema, SessionId, ToolDescriptor, ToolParameter},
    provider::{ProviderError, ToolSession},
    value_objects::ToolOutput,
};
