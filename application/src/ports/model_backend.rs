//! Model backend port
//!
//! Defines the interface for obtaining one text generation from an LLM.
//! Time-boxing is imposed by the caller, not by the backend.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during model generation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Other error: {0}")]
    Other(String),
}

/// Backend that turns a prompt into text
///
/// This port defines how the application layer talks to a language model.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Model identifier for logs and reports
    fn model_name(&self) -> &str;

    /// Generate one response for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError>;
}
