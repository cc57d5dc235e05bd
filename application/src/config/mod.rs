//! Application-level configuration.
//!
//! - [`ExecutionParams`]: iteration budget, generation timeout, pacing and failure policies

pub mod execution_params;

pub use execution_params::{DuplicatePlanPolicy, ExecutionParams, StepFailurePolicy};
