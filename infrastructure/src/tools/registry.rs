//! Tool Registry
//!
//! The [`ToolRegistry`] aggregates tool sessions and implements
//! [`ToolInvokerPort`]. It builds the shared [`ToolCatalog`] once at startup
//! and routes every call to the session that owns the tool.
//!
//! # Usage
//!
//! ```ignore
//! use stepwise_infrastructure::tools::{MathSession, ToolRegistry};
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(MathSession::new())?;
//! registry.discover().await;
//!
//! assert!(registry.catalog().contains("add"));
//! let output = registry.invoke("add", &args).await?;
//! ```
//!
//! # Discovery Process
//!
//! 1. Every session's `list_tools()` is called concurrently
//! 2. Descriptors are registered in session registration order
//! 3. On a name collision the first registered tool wins; later ones are logged
//! 4. A session that fails to list its tools is skipped with a warning
//! 5. Each catalogued tool is routed to the session that listed it

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Map, Value};
use stepwise_application::ports::tool_invoker::{InvokeError, ToolInvokerPort};
use stepwise_domain::tool::{ProviderError, SessionId, ToolCatalog, ToolOutput, ToolSession};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("A tool session with id '{0}' is already registered")]
    DuplicateSession(SessionId),
}

/// Tool registry that aggregates multiple sessions
pub struct ToolRegistry {
    /// Registered sessions, in registration order
    sessions: Vec<Arc<dyn ToolSession>>,
    catalog: ToolCatalog,
    /// Tool name -> session that listed it (rebuilt by discovery)
    routes: HashMap<String, Arc<dyn ToolSession>>,
    /// Sessions that failed discovery: (display name, error)
    failed: Vec<(String, String)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            catalog: ToolCatalog::new(),
            routes: HashMap::new(),
            failed: Vec::new(),
        }
    }

    /// Register a tool session. Session ids must be unique.
    pub fn register<S: ToolSession + 'static>(
        &mut self,
        session: S,
    ) -> Result<(), RegistryError> {
        if self.sessions.iter().any(|s| s.id() == session.id()) {
            return Err(RegistryError::DuplicateSession(session.id().clone()));
        }
        self.sessions.push(Arc::new(session));
        Ok(())
    }

    /// Discover tools from all sessions and rebuild the catalog.
    pub async fn discover(&mut self) {
        let listings = join_all(self.sessions.iter().map(|session| session.list_tools())).await;

        let mut catalog = ToolCatalog::new();
        let mut routes = HashMap::new();
        let mut failed = Vec::new();

        for (session, listing) in self.sessions.iter().zip(listings) {
            match listing {
                Ok(tools) => {
                    let count = tools.len();
                    let names: Vec<String> = tools.iter().map(|t| t.name.clone()).collect();
                    let rejected = catalog.register(tools);
                    for name in names.into_iter().filter(|n| !rejected.contains(n)) {
                        routes.entry(name).or_insert_with(|| Arc::clone(session));
                    }
                    for rejected in rejected {
                        tracing::warn!(
                            tool = %rejected,
                            session = %session.id(),
                            "Tool already registered by an earlier session, ignoring"
                        );
                    }
                    tracing::debug!(session = %session.id(), tools = count, "Discovered tools");
                }
                Err(e) => {
                    tracing::warn!(
                        session = %session.id(),
                        error = %e,
                        "Failed to discover tools from session"
                    );
                    failed.push((session.display_name().to_string(), e.to_string()));
                }
            }
        }

        self.catalog = catalog;
        self.routes = routes;
        self.failed = failed;
    }

    fn session_for(&self, tool_name: &str) -> Result<&Arc<dyn ToolSession>, InvokeError> {
        self.routes
            .get(tool_name)
            .ok_or_else(|| InvokeError::ToolNotFound(tool_name.to_string()))
    }

    /// Display names of the registered sessions
    pub fn session_names(&self) -> Vec<&str> {
        self.sessions.iter().map(|s| s.display_name()).collect()
    }

    /// Sessions that failed discovery, with the reason
    pub fn failed_sessions(&self) -> &[(String, String)] {
        &self.failed
    }

    /// Get statistics about registered tools
    pub fn stats(&self) -> RegistryStats {
        let mut tools_per_session = HashMap::new();
        for tool in self.catalog.iter() {
            *tools_per_session
                .entry(tool.session.to_string())
                .or_insert(0) += 1;
        }

        RegistryStats {
            total_sessions: self.sessions.len(),
            total_tools: self.catalog.len(),
            tools_per_session,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the registry
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_sessions: usize,
    pub total_tools: usize,
    pub tools_per_session: HashMap<String, usize>,
}

#[async_trait]
impl ToolInvokerPort for ToolRegistry {
    fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ToolOutput, InvokeError> {
        let session = self.session_for(name)?;

        match session.execute(name, arguments).await {
            Ok(raw) => Ok(ToolOutput::from_raw(&raw)),
            Err(ProviderError::ToolNotFound(tool)) => Err(InvokeError::ToolNotFound(tool)),
            Err(ProviderError::ExecutionFailed { message, raw }) => Err(InvokeError::Execution {
                tool: name.to_string(),
                message,
                output: raw.as_ref().map(ToolOutput::from_raw),
            }),
            Err(e) => Err(InvokeError::Execution {
                tool: name.to_string(),
                message: e.to_string(),
                output: None,
            }),
        }
    }
}
