//! Tier vocabulary from TOML (`[tiers]` section)
//!
//! ```toml
//! [tiers]
//! vocabulary = ["haiku", "sonnet", "opus"]   # lowest to highest
//! ```

use serde::{Deserialize, Serialize};
use verdict_domain::{ConfigIssue, ConfigIssueCode, TierVocabulary};

/// Raw tier configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTiersConfig {
    /// Tier keywords ordered from lowest to highest
    pub vocabulary: Vec<String>,
}

impl Default for FileTiersConfig {
    fn default() -> Self {
        Self {
            vocabulary: TierVocabulary::default().tiers().to_vec(),
        }
    }
}

impl FileTiersConfig {
    pub fn to_vocabulary(&self) -> (TierVocabulary, Vec<ConfigIssue>) {
        let vocabulary = TierVocabulary::new(&self.vocabulary);
        if vocabulary.is_empty() {
            let issue = ConfigIssue::warning(
                ConfigIssueCode::EmptyTierVocabulary,
                "tiers.vocabulary is empty, falling back to haiku < sonnet < opus",
            );
            return (TierVocabulary::default(), vec![issue]);
        }
        (vocabulary, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_vocabulary() {
        let toml_str = r#"
[tiers]
vocabulary = ["mini", "standard", "pro"]
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let (vocabulary, issues) = config.tiers.to_vocabulary();
        assert!(issues.is_empty());
        assert_eq!(vocabulary.rank("gpt-pro"), Some(2));
    }

    #[test]
    fn test_empty_vocabulary_falls_back() {
        let config = FileTiersConfig {
            vocabulary: vec!["  ".to_string()],
        };
        let (vocabulary, issues) = config.to_vocabulary();
        assert_eq!(vocabulary, TierVocabulary::default());
        assert_eq!(issues[0].code, ConfigIssueCode::EmptyTierVocabulary);
    }
}
