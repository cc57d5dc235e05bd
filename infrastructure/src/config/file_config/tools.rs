//! Tools configuration from TOML (`[tools]` section)
//!
//! Tools come from the built-in math session and from any number of MCP
//! servers spoken to over stdio.
//!
//! # Example
//!
//! ```toml
//! [tools]
//! builtin_math = true
//!
//! [[tools.mcp_servers]]
//! name = "math"
//! command = "python"
//! args = ["example2.py"]
//! ```

use super::ConfigValidationError;
use crate::tools::MATH_SESSION_ID;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// MCP server configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMcpServerConfig {
    /// Server name, used as the tool session id
    pub name: String,
    /// Command to start the server
    pub command: String,
    /// Command arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Raw tools configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Register the in-process math tools (default: true)
    pub builtin_math: bool,
    /// MCP servers to spawn, in registration order
    pub mcp_servers: Vec<FileMcpServerConfig>,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            builtin_math: true,
            mcp_servers: Vec::new(),
        }
    }
}

impl FileToolsConfig {
    /// Server names double as session ids, so they must be unique and must
    /// not take the built-in session's id.
    pub(super) fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for server in &self.mcp_servers {
            if server.command.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyMcpCommand(server.name.clone()));
            }
            if server.name == MATH_SESSION_ID {
                issues.push(ConfigValidationError::ReservedMcpServerName(server.name.clone()));
            } else if !seen.insert(server.name.as_str()) {
                issues.push(ConfigValidationError::DuplicateMcpServer(server.name.clone()));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_env_deserialize() {
        let toml_str = r#"
builtin_math = false

[[mcp_servers]]
name = "math"
command = "uv"
args = ["run", "server.py"]
env = { PYTHONUNBUFFERED = "1" }
"#;
        let config: FileToolsConfig = toml::from_str(toml_str).unwrap();
        let server = &config.mcp_servers[0];
        assert_eq!(server.command, "uv");
        assert_eq!(server.env.get("PYTHONUNBUFFERED").map(String::as_str), Some("1"));
        assert!(config.validate().is_empty());
    }

    fn server(name: &str) -> FileMcpServerConfig {
        FileMcpServerConfig {
            name: name.to_string(),
            command: "python".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_rejects_duplicate_server_names() {
        let config = FileToolsConfig {
            builtin_math: true,
            mcp_servers: vec![server("math"), server("files"), server("math")],
        };
        assert_eq!(
            config.validate(),
            vec![ConfigValidationError::DuplicateMcpServer("math".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_builtin_session_name() {
        let config = FileToolsConfig {
            builtin_math: true,
            mcp_servers: vec![server(MATH_SESSION_ID)],
        };
        assert_eq!(
            config.validate(),
            vec![ConfigValidationError::ReservedMcpServerName(MATH_SESSION_ID.to_string())]
        );
    }
}
