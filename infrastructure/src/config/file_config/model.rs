//! Model configuration from TOML (`[model]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};

/// Raw model backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Backend provider; only `gemini` is supported
    pub provider: String,
    /// Model identifier sent to the provider
    pub name: String,
    /// Override for the provider's API base URL
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            name: "gemini-2.0-flash".to_string(),
            endpoint: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl FileModelConfig {
    pub(super) fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        if self.name.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyModelName);
        }
        if !self.provider.eq_ignore_ascii_case("gemini") {
            issues.push(ConfigValidationError::UnsupportedProvider(
                self.provider.clone(),
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_provider() {
        let config = FileModelConfig {
            provider: "openai".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            vec![ConfigValidationError::UnsupportedProvider(
                "openai".to_string()
            )]
        );
    }
}
