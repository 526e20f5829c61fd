//! Agent selection configuration from TOML (`[selection]` section)
//!
//! ```toml
//! [selection]
//! store = ".verdict/selections.json"
//!
//! [[selection.validators]]
//! name = "validator-api"
//! category = "domain"
//! keywords = ["api", "endpoint", "graphql"]
//! ```
//!
//! `universal` validators always apply; `domain` and `feature` validators
//! apply when one of their keywords appears in the work item.

use crate::selection::ValidatorRule;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use verdict_domain::{AgentCategory, AgentIdentity, ConfigIssue, ConfigIssueCode};

/// One `[[selection.validators]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileValidatorRule {
    pub name: String,
    pub category: AgentCategory,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl FileValidatorRule {
    fn new(name: &str, category: AgentCategory, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Raw selection configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSelectionConfig {
    /// JSON file remembering each work item's selection
    pub store: PathBuf,
    pub validators: Vec<FileValidatorRule>,
}

impl Default for FileSelectionConfig {
    fn default() -> Self {
        use AgentCategory::{Domain, Feature, Universal};
        Self {
            store: PathBuf::from(".verdict/selections.json"),
            validators: vec![
                FileValidatorRule::new("validator-general", Universal, &[]),
                FileValidatorRule::new(
                    "validator-api",
                    Domain,
                    &["api", "endpoint", "rest", "graphql", "http"],
                ),
                FileValidatorRule::new(
                    "validator-database",
                    Domain,
                    &["database", "sql", "schema", "migration", "postgres", "table"],
                ),
                FileValidatorRule::new(
                    "validator-security",
                    Domain,
                    &["auth", "login", "password", "token", "permission", "encryption"],
                ),
                FileValidatorRule::new(
                    "validator-frontend",
                    Domain,
                    &["ui", "frontend", "react", "css", "page", "form"],
                ),
                FileValidatorRule::new(
                    "validator-devops",
                    Domain,
                    &["deploy", "docker", "kubernetes", "pipeline", "ci"],
                ),
                FileValidatorRule::new(
                    "validator-payments",
                    Feature,
                    &["payment", "checkout", "invoice", "billing", "subscription"],
                ),
                FileValidatorRule::new(
                    "validator-notifications",
                    Feature,
                    &["notification", "email", "sms", "push"],
                ),
            ],
        }
    }
}

impl FileSelectionConfig {
    /// Convert to selection rules; provider entries are not validators
    pub fn to_rules(&self) -> (Vec<ValidatorRule>, Vec<ConfigIssue>) {
        let mut rules = Vec::new();
        let mut issues = Vec::new();
        for entry in &self.validators {
            if entry.category == AgentCategory::Provider || entry.name.trim().is_empty() {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "selection.validators.category".to_string(),
                        value: entry.category.to_string(),
                        valid_values: vec![
                            "universal".to_string(),
                            "domain".to_string(),
                            "feature".to_string(),
                        ],
                    },
                    format!("selection validator '{}' was ignored", entry.name),
                ));
                continue;
            }
            rules.push(ValidatorRule::new(
                AgentIdentity::new(entry.name.trim(), entry.category),
                entry.keywords.iter().cloned(),
            ));
        }
        (rules, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_have_one_universal() {
        let (rules, issues) = FileSelectionConfig::default().to_rules();
        assert!(issues.is_empty());
        assert_eq!(
            rules
                .iter()
                .filter(|r| r.identity.category == AgentCategory::Universal)
                .count(),
            1
        );
    }

    #[test]
    fn test_selection_config_deserialize() {
        let toml_str = r#"
[selection]
store = "/tmp/selections.json"

[[selection.validators]]
name = "validator-mobile"
category = "domain"
keywords = ["ios", "android"]

[[selection.validators]]
name = "claude-sonnet"
category = "provider"
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.selection.store, PathBuf::from("/tmp/selections.json"));

        let (rules, issues) = config.selection.to_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].identity.name, "validator-mobile");
        assert_eq!(issues.len(), 1);
    }
}
