//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod execution;
mod logging;
mod model;
mod output;
mod tools;

pub use execution::FileExecutionConfig;
pub use logging::FileLoggingConfig;
pub use model::FileModelConfig;
pub use output::FileOutputConfig;
pub use tools::{FileMcpServerConfig, FileToolsConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("execution.max_iterations cannot be 0")]
    InvalidMaxIterations,

    #[error("execution.generation_timeout_secs cannot be 0")]
    InvalidTimeout,

    #[error("model.name cannot be empty")]
    EmptyModelName,

    #[error("model.provider '{0}' is not supported (expected 'gemini')")]
    UnsupportedProvider(String),

    #[error("tools.mcp_servers '{0}': command cannot be empty")]
    EmptyMcpCommand(String),

    #[error("tools.mcp_servers '{0}': name is used by more than one server")]
    DuplicateMcpServer(String),

    #[error("tools.mcp_servers '{0}': name is reserved for the built-in tools")]
    ReservedMcpServerName(String),

    #[error("{field}: unknown value '{value}'")]
    UnknownPolicy { field: &'static str, value: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model backend selection
    pub model: FileModelConfig,
    /// Iteration budget, timeouts and failure policies
    pub execution: FileExecutionConfig,
    /// Tool sessions
    pub tools: FileToolsConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        issues.extend(self.model.validate());
        issues.extend(self.execution.validate());
        issues.extend(self.tools.validate());
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_domain::OutputFormat;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[model]
name = "gemini-1.5-pro"
api_key_env = "MY_KEY"

[execution]
max_iterations = 6
generation_timeout_secs = 30
iteration_delay_ms = 250
duplicate_plan = "fail"
on_step_failure = "continue"

[tools]
builtin_math = false

[[tools.mcp_servers]]
name = "math"
command = "python"
args = ["example2.py"]

[output]
format = "answer"
color = false

[logging]
conversation_log = "/tmp/stepwise.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.name, "gemini-1.5-pro");
        assert_eq!(config.model.api_key_env, "MY_KEY");
        assert_eq!(config.execution.max_iterations, 6);
        assert!(!config.tools.builtin_math);
        assert_eq!(config.tools.mcp_servers[0].args, vec!["example2.py"]);
        assert_eq!(config.output.format, Some(OutputFormat::Answer));
        assert!(!config.output.color);
        assert!(config.logging.conversation_log.is_some());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[execution]
max_iterations = 10
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.execution.max_iterations, 10);
        // Defaults should apply
        assert_eq!(config.execution.generation_timeout_secs, 20);
        assert_eq!(config.model.name, "gemini-2.0-flash");
        assert!(config.tools.builtin_math);
        assert!(config.output.color);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_collects_all_issues() {
        let mut config = FileConfig::default();
        config.model.name = " ".to_string();
        config.execution.max_iterations = 0;
        config.execution.on_step_failure = "retry".to_string();
        config.tools.mcp_servers.push(FileMcpServerConfig {
            name: "broken".to_string(),
            ..Default::default()
        });

        let issues = config.validate();
        assert!(issues.contains(&ConfigValidationError::EmptyModelName));
        assert!(issues.contains(&ConfigValidationError::InvalidMaxIterations));
        assert!(issues.contains(&ConfigValidationError::UnknownPolicy {
            field: "execution.on_step_failure",
            value: "retry".to_string()
        }));
        assert!(issues.contains(&ConfigValidationError::EmptyMcpCommand("broken".to_string())));
    }
}
