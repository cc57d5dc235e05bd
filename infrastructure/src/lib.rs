//! Infrastructure layer for stepwise
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the Gemini model backend, MCP and built-in
//! tool sessions behind the tool registry, the JSONL conversation logger,
//! and configuration file loading.

pub mod config;
pub mod logging;
pub mod mcp;
pub mod model;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileExecutionConfig, FileLoggingConfig,
    FileMcpServerConfig, FileModelConfig, FileOutputConfig, FileToolsConfig,
};
pub use logging::JsonlConversationLogger;
pub use mcp::{McpError, McpSession};
pub use model::GeminiBackend;
pub use tools::{MathSession, RegistryError, RegistryStats, ToolRegistry};
