//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl DomainError {
    /// Validate a user query before a task is started for it.
    pub fn check_query(query: &str) -> Result<(), DomainError> {
        if query.trim().is_empty() {
            return Err(DomainError::InvalidQuery("query is empty".to_string()));
        }
        Ok(())
    }
}
