//! Dispatch configuration from TOML (`[dispatch]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [dispatch]
//! max_concurrency = 4
//! max_retries = 3
//! base_backoff_ms = 1000
//! timeout_secs = 300
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use verdict_application::DispatchParams;
use verdict_domain::{ConfigIssue, ConfigIssueCode};

/// Raw dispatch configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    /// Agents invoked at the same time
    pub max_concurrency: usize,
    /// Retries for transient failures
    pub max_retries: u32,
    /// Base of the exponential backoff, in milliseconds
    pub base_backoff_ms: u64,
    /// Wall-clock limit for one task (unset = no limit)
    pub timeout_secs: Option<u64>,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        let params = DispatchParams::default();
        Self {
            max_concurrency: params.max_concurrency,
            max_retries: params.max_retries,
            base_backoff_ms: params.base_backoff.as_millis() as u64,
            timeout_secs: None,
        }
    }
}

impl FileDispatchConfig {
    /// Convert to [`DispatchParams`], reporting values that were replaced
    pub fn to_dispatch_params(&self) -> (DispatchParams, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let defaults = DispatchParams::default();

        let max_concurrency = if self.max_concurrency == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroValue {
                    field: "dispatch.max_concurrency".to_string(),
                },
                format!(
                    "dispatch.max_concurrency cannot be 0, falling back to {}",
                    defaults.max_concurrency
                ),
            ));
            defaults.max_concurrency
        } else {
            self.max_concurrency
        };

        let timeout = match self.timeout_secs {
            Some(0) => {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::ZeroValue {
                        field: "dispatch.timeout_secs".to_string(),
                    },
                    "dispatch.timeout_secs is 0, running without a timeout",
                ));
                None
            }
            other => other.map(Duration::from_secs),
        };

        let params = DispatchParams::default()
            .with_max_concurrency(max_concurrency)
            .with_max_retries(self.max_retries)
            .with_base_backoff(Duration::from_millis(self.base_backoff_ms))
            .with_task_timeout(timeout);
        (params, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_config_default_matches_params() {
        let (params, issues) = FileDispatchConfig::default().to_dispatch_params();
        assert_eq!(params, DispatchParams::default());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_dispatch_config_deserialize() {
        let toml_str = r#"
[dispatch]
max_concurrency = 8
base_backoff_ms = 0
timeout_secs = 120
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let (params, issues) = config.dispatch.to_dispatch_params();
        assert!(issues.is_empty());
        assert_eq!(params.max_concurrency, 8);
        assert_eq!(params.max_retries, 3);
        assert_eq!(params.base_backoff, Duration::ZERO);
        assert_eq!(params.task_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_zero_concurrency_is_an_error() {
        let config = FileDispatchConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        let (params, issues) = config.to_dispatch_params();
        assert_eq!(params.max_concurrency, 4);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }
}
