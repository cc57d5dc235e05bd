//! Tool invoker port
//!
//! Resolves a tool by name, calls the session that owns it and returns the
//! result in canonical [`ToolOutput`] form.

use async_trait::async_trait;
use serde_json::{Map, Value};
use stepwise_domain::tool::{ToolCatalog, ToolDescriptor, ToolOutput};
use thiserror::Error;

/// Errors that can occur while invoking a tool
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvokeError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The tool ran and failed; `output` keeps whatever it returned
    #[error("Tool '{tool}' failed: {message}")]
    Execution {
        tool: String,
        message: String,
        output: Option<ToolOutput>,
    },
}

/// Port for tool invocation
///
/// This port defines how the application layer invokes tools.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ToolInvokerPort: Send + Sync {
    /// The catalog of all invocable tools
    fn catalog(&self) -> &ToolCatalog;

    /// Look up a tool descriptor
    fn lookup(&self, name: &str) -> Result<&ToolDescriptor, InvokeError> {
        self.catalog()
            .lookup(name)
            .map_err(|_| InvokeError::ToolNotFound(name.to_string()))
    }

    /// Invoke `name` with coerced arguments.
    ///
    /// No timeout is applied here; the owning session bounds its own calls.
    async fn invoke(&self, name: &str, arguments: &Map<String, Value>)
    -> Result<ToolOutput, InvokeError>;
}
