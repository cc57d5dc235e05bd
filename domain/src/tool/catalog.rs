//! Tool catalog
//!
//! Read-only registry of [`ToolDescriptor`]s, rebuilt for every process run
//! and shared by all tasks. It also renders the numbered tool listing that is
//! embedded verbatim in every prompt.

use std::collections::HashMap;
use thiserror::Error;

use super::entities::ToolDescriptor;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
}

/// Registry of tool descriptors, in registration order
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append descriptors to the catalog.
    ///
    /// The first descriptor registered under a name is kept. Returns the
    /// names that were rejected as duplicates.
    pub fn register(&mut self, descriptors: Vec<ToolDescriptor>) -> Vec<String> {
        let mut rejected = Vec::new();
        for descriptor in descriptors {
            if self.index.contains_key(&descriptor.name) {
                rejected.push(descriptor.name);
                continue;
            }
            self.index.insert(descriptor.name.clone(), self.tools.len());
            self.tools.push(descriptor);
        }
        rejected
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolDescriptor, CatalogError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| CatalogError::ToolNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Numbered listing, one line per tool:
    /// `i. name(param: type, ...) - description`.
    ///
    /// A tool with a malformed schema gets a placeholder line instead.
    pub fn describe_all(&self) -> String {
        if self.tools.is_empty() {
            return "No tools available".to_string();
        }

        self.tools
            .iter()
            .enumerate()
            .map(|(i, tool)| match tool.signature() {
                Ok(signature) => format!("{}. {} - {}", i + 1, signature, tool.description),
                Err(reason) => format!(
                    "{}. {} - error processing tool schema: {}",
                    i + 1,
                    tool.name,
                    reason
                ),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::{ParamType, ParameterSchema, SessionId, ToolParameter};

    fn tool(name: &str, description: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, description, SessionId::new("math"))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut catalog = ToolCatalog::new();
        let rejected = catalog.register(vec![tool("add", "Add"), tool("sqrt", "Root")]);
        assert!(rejected.is_empty());
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("sqrt").unwrap().description, "Root");
    }

    #[test]
    fn test_lookup_missing() {
        let catalog = ToolCatalog::new();
        assert_eq!(
            catalog.lookup("clarify").unwrap_err(),
            CatalogError::ToolNotFound("clarify".to_string())
        );
    }

    #[test]
    fn test_first_registration_wins() {
        let mut catalog = ToolCatalog::new();
        catalog.register(vec![tool("add", "first")]);
        let rejected = catalog.register(vec![tool("add", "second"), tool("mine", "Mine")]);
        assert_eq!(rejected, vec!["add".to_string()]);
        assert_eq!(catalog.lookup("add").unwrap().description, "first");
        assert_eq!(catalog.names(), vec!["add", "mine"]);
    }

    #[test]
    fn test_describe_all() {
        let mut catalog = ToolCatalog::new();
        catalog.register(vec![
            tool("add", "Add two numbers")
                .with_parameter(ToolParameter::new("a", ParamType::Integer))
                .with_parameter(ToolParameter::new("b", ParamType::Integer)),
            tool("open_paint", "Open the canvas"),
        ]);
        assert_eq!(
            catalog.describe_all(),
            "1. add(a: integer, b: integer) - Add two numbers\n\
             2. open_paint(no parameters) - Open the canvas"
        );
    }

    #[test]
    fn test_describe_all_with_malformed_schema() {
        let mut catalog = ToolCatalog::new();
        catalog.register(vec![
            tool("broken", "Broken").with_schema(ParameterSchema::Malformed {
                reason: "input schema is not an object".to_string(),
            }),
            tool("sqrt", "Square root").with_parameter(ToolParameter::new("a", ParamType::Integer)),
        ]);
        let listing = catalog.describe_all();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(
            lines[0],
            "1. broken - error processing tool schema: input schema is not an object"
        );
        assert_eq!(lines[1], "2. sqrt(a: integer) - Square root");
    }

    #[test]
    fn test_describe_empty_catalog() {
        assert_eq!(ToolCatalog::new().describe_all(), "No tools available");
    }
}
