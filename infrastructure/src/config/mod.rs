//! Configuration file loading for stepwise
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment variables `STEPWISE_<SECTION>__<KEY>`
//! 2. `--config <path>` specified file
//! 3. Project root: `./stepwise.toml` or `./.stepwise.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/stepwise/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileExecutionConfig, FileLoggingConfig, FileMcpServerConfig,
    FileModelConfig, FileOutputConfig, FileToolsConfig,
};
pub use loader::ConfigLoader;
