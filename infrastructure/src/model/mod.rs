//! Model backends
//!
//! Adapters implementing the [`ModelBackend`](stepwise_application::ModelBackend)
//! port. Only Google's Gemini REST API is wired up.

mod gemini;

pub use gemini::{DEFAULT_GEMINI_ENDPOINT, GeminiBackend};
