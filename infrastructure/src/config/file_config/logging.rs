//! Evaluation log configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving one record per agent result, failure and report
    pub evaluation_log: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_logging_config_deserialize() {
        let toml_str = r#"
[logging]
evaluation_log = "logs/evaluations.jsonl"
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.logging.evaluation_log.unwrap().to_string_lossy(),
            "logs/evaluations.jsonl"
        );
    }
}
