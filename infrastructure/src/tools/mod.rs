//! Tool sessions and routing
//!
//! - `builtin`: in-process math tools, always available unless disabled
//! - `registry`: aggregates sessions (builtin and MCP) behind `ToolInvokerPort`

pub mod builtin;

mod registry;

pub use builtin::{MATH_SESSION_ID, MathSession};
pub use registry::{RegistryError, RegistryStats, ToolRegistry};
