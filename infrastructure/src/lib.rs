//! Infrastructure layer for verdict
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod batch;
pub mod config;
pub mod invoker;
pub mod logging;
pub mod selection;

// Re-export commonly used types
pub use batch::{BatchFileError, load_batch_file, parse_batch};
pub use config::{
    ConfigLoader, ConfigSource, ConfigValidationError, FileAgentsConfig, FileConfig,
    FileDispatchConfig, FileLoggingConfig, FileOutputConfig, FilePricingRow, FileSelectionConfig,
    FileTiersConfig, FileValidatorRule, to_price_table,
};
pub use invoker::CommandInvoker;
pub use logging::JsonlEvaluationLogger;
pub use selection::{JsonSelectionStore, StaticSelectionStrategy, ValidatorRule};
