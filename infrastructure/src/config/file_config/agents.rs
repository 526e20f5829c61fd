//! Agent configuration from TOML (`[agents]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [agents]
//! command = "llm -m {agent}"
//! providers = ["claude-haiku", "claude-sonnet", "gpt-4o"]
//!
//! [agents.commands]
//! "gpt-4o" = "openai-chat --model gpt-4o"
//!
//! [agents.models]
//! "validator-security" = "sonnet"
//! ```
//!
//! Commands receive the prompt on stdin. `{agent}`, `{task}` and `{mode}`
//! are replaced with the agent name, task id and evaluation mode.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use verdict_domain::{AgentCategory, AgentIdentity, ConfigIssue, ConfigIssueCode};

/// Raw agent configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentsConfig {
    /// Default command template for every agent
    pub command: String,
    /// Per-agent command templates, keyed by agent name
    pub commands: BTreeMap<String, String>,
    /// Providers queried by `recommend` when none are given
    pub providers: Vec<String>,
    /// Pricing model per agent name, for agents not named after a model
    pub models: BTreeMap<String, String>,
}

impl Default for FileAgentsConfig {
    fn default() -> Self {
        Self {
            command: "llm -m {agent}".to_string(),
            commands: BTreeMap::new(),
            providers: vec![
                "claude-haiku".to_string(),
                "claude-sonnet".to_string(),
                "claude-opus".to_string(),
            ],
            models: BTreeMap::new(),
        }
    }
}

impl FileAgentsConfig {
    /// Parse the default providers, skipping entries that do not parse
    pub fn parse_providers(&self) -> (Vec<AgentIdentity>, Vec<ConfigIssue>) {
        parse_identities(&self.providers, AgentCategory::Provider, "agents.providers")
    }
}

/// Parse `category:name` / `name` entries into identities
pub(super) fn parse_identities(
    specs: &[String],
    default_category: AgentCategory,
    field: &str,
) -> (Vec<AgentIdentity>, Vec<ConfigIssue>) {
    let mut identities = Vec::new();
    let mut issues = Vec::new();
    for spec in specs {
        match AgentIdentity::parse(spec, default_category) {
            Ok(identity) => identities.push(identity),
            Err(e) => issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidEnumValue {
                    field: field.to_string(),
                    value: spec.clone(),
                    valid_values: ["universal", "domain", "feature", "provider"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
                format!("{}: {}", field, e),
            )),
        }
    }
    (identities, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agents_config_deserialize() {
        let toml_str = r#"
[agents]
command = "my-llm --model {agent}"
providers = ["claude-sonnet", "provider:gpt-4o", "bogus:thing"]

[agents.commands]
"gpt-4o" = "openai-chat"

[agents.models]
"validator-security" = "sonnet"
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agents.command, "my-llm --model {agent}");
        assert_eq!(config.agents.commands["gpt-4o"], "openai-chat");
        assert_eq!(config.agents.models["validator-security"], "sonnet");

        let (providers, issues) = config.agents.parse_providers();
        assert_eq!(
            providers,
            vec![
                AgentIdentity::provider("claude-sonnet"),
                AgentIdentity::provider("gpt-4o"),
            ]
        );
        assert_eq!(issues.len(), 1);
    }
}
