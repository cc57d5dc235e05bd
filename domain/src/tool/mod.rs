//! Tool domain module
//!
//! How a planner's loosely-typed tool requests become well-typed calls.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolCatalog  │───▶│   coerce()   │───▶│  ToolOutput  │
//! │ (registry)   │    │ (positional) │    │ (canonical)  │
//! └──────┬───────┘    └──────────────┘    └──────────────┘
//!        │
//!        └─ "add" → ToolDescriptor { schema: [a: integer, b: integer], session }
//! ```
//!
//! # Key Types
//!
//! - [`ToolCatalog`]: read-only registry of descriptors, renders the prompt listing
//! - [`ToolDescriptor`]: name, description, ordered [`ParameterSchema`], owning session
//! - [`coerce`]: binds raw values to schema parameters by position and converts them
//! - [`ToolOutput`]: closed variant every raw tool result is normalised into
//! - [`ToolSession`]: abstraction for external tool sources (MCP, builtin)
//!
//! # Architecture
//!
//! - **Domain** (this module): pure definitions and conversions, no I/O
//! - **Application** (`ToolInvokerPort`): port trait for invoking tools
//! - **Infrastructure** (`ToolRegistry`): session discovery and call routing

pub mod catalog;
pub mod coercion;
pub mod entities;
pub mod provider;
pub mod value_objects;

pub use catalog::{CatalogError, ToolCatalog};
pub use coercion::{CoercedArguments, CoercionError, coerce};
pub use entities::{ParamType, ParameterSchema, SessionId, ToolDescriptor, ToolParameter};
pub use provider::{ProviderError, ToolSession};
pub use value_objects::ToolOutput;
