//! Error types for the MCP adapter

use stepwise_domain::ProviderError;
use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur when talking to an MCP server over stdio
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to spawn MCP server: {0}")]
    SpawnError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("JSON-RPC error (code {code}): {message}")]
    RpcError { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl From<McpError> for ProviderError {
    fn from(e: McpError) -> Self {
        match e {
            McpError::CommandNotFound(cmd) => ProviderError::NotAvailable(cmd),
            McpError::RpcError { message, .. } => ProviderError::execution_failed(message),
            other => ProviderError::Transport(other.to_string()),
        }
    }
}
