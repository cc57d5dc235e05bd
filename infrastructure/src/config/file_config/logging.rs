//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL conversation transcript path
    pub conversation_log: Option<PathBuf>,
    /// Directory for daily rolling operation logs
    pub file_dir: Option<PathBuf>,
}
