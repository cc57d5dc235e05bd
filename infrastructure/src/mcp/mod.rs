//! MCP (Model Context Protocol) tool sessions over stdio.

pub mod error;
pub mod protocol;
pub mod session;

pub use error::McpError;
pub use session::McpSession;
