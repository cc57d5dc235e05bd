//! Tool session abstraction
//!
//! A [`ToolSession`] is an external source of tools: an MCP server reached
//! over stdio, or an in-process session such as the built-in math tools.
//! Sessions are registered with the tool registry, which asks each one for
//! its tools once at startup and routes every call back to the session that
//! owns the tool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ToolRegistry                            │
//! │  (builds the ToolCatalog, routes calls by SessionId)        │
//! └─────────────────────────────────────────────────────────────┘
//!           │                      │                      │
//!           ▼                      ▼                      ▼
//!    ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//!    │ MathSession  │      │  McpSession  │      │  McpSession  │
//!    │  (builtin)   │      │   "math"     │      │   "gmail"    │
//!    └──────────────┘      └──────────────┘      └──────────────┘
//! ```
//!
//! Sessions return raw JSON results; normalisation into
//! [`ToolOutput`](super::value_objects::ToolOutput) happens at the invoker
//! boundary, never inside a session.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::entities::{SessionId, ToolDescriptor};

/// Error type for tool session operations
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Session is not available (e.g., server command not installed)
    #[error("Session not available: {0}")]
    NotAvailable(String),

    /// Failed to list tools from the session
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Tool not found in this session
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The tool ran and reported a failure; `raw` keeps its result when present
    #[error("Execution failed: {message}")]
    ExecutionFailed { message: String, raw: Option<Value> },

    /// Transport or protocol failure talking to the session
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn execution_failed(message: impl Into<String>) -> Self {
        ProviderError::ExecutionFailed {
            message: message.into(),
            raw: None,
        }
    }
}

/// External source of tools
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Handle stamped on every descriptor this session reports
    fn id(&self) -> &SessionId;

    /// Display name for user-facing output
    fn display_name(&self) -> &str;

    /// List the tools this session can execute.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError>;

    /// Execute a tool with named, already coerced arguments.
    ///
    /// Returns the raw result envelope as the session produced it.
    async fn execute(&self, name: &str, arguments: &Map<String, Value>)
    -> Result<Value, ProviderError>;
}
