//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod run_task;
pub mod task_runner;

#[cfg(test)]
pub(crate) mod test_support;
