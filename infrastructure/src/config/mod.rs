//! Configuration file loading for verdict
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `VERDICT_*` environment variables (`VERDICT_DISPATCH__MAX_CONCURRENCY=8`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./verdict.toml` or `./.verdict.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/verdict/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentsConfig, FileConfig, FileDispatchConfig, FileLoggingConfig,
    FileOutputConfig, FilePricingRow, FileSelectionConfig, FileTiersConfig, FileValidatorRule,
    to_price_table,
};
pub use loader::{ConfigLoader, ConfigSource};
