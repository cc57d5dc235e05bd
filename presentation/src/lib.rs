//! Presentation layer for stepwise
//!
//! This crate contains the CLI definition, the console progress observer
//! and the task report formatter.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Demo, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::ConsoleProgress;
