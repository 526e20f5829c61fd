//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod agents;
mod dispatch;
mod logging;
mod output;
mod pricing;
mod selection;
mod tiers;

pub use agents::FileAgentsConfig;
pub use dispatch::FileDispatchConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use pricing::{FilePricingRow, to_price_table};
pub use selection::{FileSelectionConfig, FileValidatorRule};
pub use tiers::FileTiersConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use verdict_domain::{ConfigIssue, IssueLevel};

/// Raised when a configuration has at least one fatal issue
#[derive(Debug, Error)]
#[error("invalid configuration: {}", summarize(.0))]
pub struct ConfigValidationError(pub Vec<ConfigIssue>);

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Fan-out, retry and timeout settings
    pub dispatch: FileDispatchConfig,
    /// Ordered tier vocabulary for recommendations
    pub tiers: FileTiersConfig,
    /// Per-model prices; empty means the built-in table
    pub pricing: Vec<FilePricingRow>,
    /// How agents are invoked
    pub agents: FileAgentsConfig,
    /// Work-item agent selection
    pub selection: FileSelectionConfig,
    /// Structured evaluation log
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks, in order:
    /// 1. Dispatch values (zero concurrency, zero timeout)
    /// 2. Empty tier vocabulary
    /// 3. Duplicate or invalid pricing rows
    /// 4. Unparseable provider and validator entries
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.dispatch.to_dispatch_params().1);
        issues.extend(self.tiers.to_vocabulary().1);
        issues.extend(to_price_table(&self.pricing).1);
        issues.extend(self.agents.parse_providers().1);
        issues.extend(self.selection.to_rules().1);
        issues
    }

    /// Fail when any issue is fatal; warnings are returned for display
    pub fn ensure_valid(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let (errors, warnings): (Vec<_>, Vec<_>) = self
            .validate()
            .into_iter()
            .partition(|i| i.level == IssueLevel::Error);
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigValidationError(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_domain::{ConfigIssueCode, OutputFormat};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[dispatch]
max_concurrency = 2
max_retries = 1

[tiers]
vocabulary = ["small", "large"]

[[pricing]]
model = "large"
input_per_million = 10.0
output_per_million = 30.0

[agents]
command = "echo {agent}"
providers = ["small-model", "large-model"]

[logging]
evaluation_log = "eval.jsonl"

[output]
format = "json"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.dispatch.max_concurrency, 2);
        assert_eq!(config.dispatch.max_retries, 1);
        assert_eq!(config.tiers.vocabulary, vec!["small", "large"]);
        assert_eq!(config.pricing.len(), 1);
        assert_eq!(config.agents.providers.len(), 2);
        assert!(config.logging.evaluation_log.is_some());
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.output.color);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[dispatch]
max_concurrency = 16
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.dispatch.max_concurrency, 16);
        // Defaults should apply
        assert_eq!(config.dispatch.max_retries, 3);
        assert_eq!(config.tiers, FileTiersConfig::default());
        assert!(config.output.color);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert!(config.ensure_valid().unwrap().is_empty());
    }

    #[test]
    fn test_ensure_valid_separates_errors_from_warnings() {
        let mut config = FileConfig::default();
        config.tiers.vocabulary.clear();
        let warnings = config.ensure_valid().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, ConfigIssueCode::EmptyTierVocabulary);

        config.dispatch.max_concurrency = 0;
        let err = config.ensure_valid().unwrap_err();
        assert_eq!(err.0.len(), 1);
        assert!(err.to_string().contains("max_concurrency"));
    }
}
