//! Prompt domain
//!
//! The per-turn task prompt: role, response protocol, current execution
//! state and the tool listing.

mod template;

pub use template::TaskPromptTemplate;
