//! Keyword-table agent selection.

use async_trait::async_trait;
use tracing::debug;
use verdict_application::{SelectionError, SelectionStrategy};
use verdict_domain::{AgentCategory, AgentIdentity, EvaluationTask};

/// A validator and the keywords that switch it on
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorRule {
    pub identity: AgentIdentity,
    /// Lowercased keywords; ignored for universal validators
    pub keywords: Vec<String>,
}

impl ValidatorRule {
    pub fn new<I, S>(identity: AgentIdentity, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            identity,
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    fn matches(&self, words: &[String]) -> bool {
        self.keywords.iter().any(|keyword| {
            words.iter().any(|word| {
                word == keyword || (keyword.len() >= 4 && word.starts_with(keyword.as_str()))
            })
        })
    }
}

/// Selects validators for a work item from a static keyword table
///
/// Every `universal` validator applies. `domain` and `feature` validators
/// apply when one of their keywords appears as a word in the work item's
/// subject or instructions; keywords of four letters or more also match
/// longer words they start (`deploy` matches `deployment`). The selection
/// lists universal, then domain, then feature validators, each in table
/// order.
pub struct StaticSelectionStrategy {
    rules: Vec<ValidatorRule>,
}

impl StaticSelectionStrategy {
    pub fn new(rules: Vec<ValidatorRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ValidatorRule] {
        &self.rules
    }

    /// Pure selection logic, independent of the async port
    pub fn select(&self, text: &str) -> Vec<AgentIdentity> {
        let words = words(text);
        let mut selected: Vec<AgentIdentity> = Vec::new();
        for category in [
            AgentCategory::Universal,
            AgentCategory::Domain,
            AgentCategory::Feature,
        ] {
            for rule in self.rules.iter().filter(|r| r.identity.category == category) {
                let applies = category == AgentCategory::Universal || rule.matches(&words);
                if applies && !selected.contains(&rule.identity) {
                    selected.push(rule.identity.clone());
                }
            }
        }
        selected
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

#[async_trait]
impl SelectionStrategy for StaticSelectionStrategy {
    async fn select_for(
        &self,
        task: &EvaluationTask,
    ) -> Result<Vec<AgentIdentity>, SelectionError> {
        let text = format!("{}\n{}", task.instructions(), task.subject());
        let selected = self.select(&text);
        debug!(
            "Static selection for {}: {} of {} validators",
            task.id(),
            selected.len(),
            self.rules.len()
        );
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> StaticSelectionStrategy {
        StaticSelectionStrategy::new(vec![
            ValidatorRule::new(AgentIdentity::feature("validator-payments"), ["checkout", "billing"]),
            ValidatorRule::new(AgentIdentity::domain("validator-api"), ["api", "endpoint"]),
            ValidatorRule::new(AgentIdentity::universal("validator-general"), Vec::<String>::new()),
            ValidatorRule::new(AgentIdentity::domain("validator-devops"), ["deploy", "ci"]),
        ])
    }

    #[test]
    fn test_universal_always_selected_first() {
        let selected = strategy().select("Improve the onboarding copy");
        assert_eq!(selected, vec![AgentIdentity::universal("validator-general")]);
    }

    #[test]
    fn test_keywords_select_domain_then_feature() {
        let selected = strategy().select("Add a checkout API endpoint and deployment notes");
        assert_eq!(
            selected,
            vec![
                AgentIdentity::universal("validator-general"),
                AgentIdentity::domain("validator-api"),
                AgentIdentity::domain("validator-devops"),
                AgentIdentity::feature("validator-payments"),
            ]
        );
    }

    #[test]
    fn test_short_keywords_need_whole_words() {
        let selected = strategy().select("Show the city on the capital page");
        assert!(!selected.contains(&AgentIdentity::domain("validator-devops")));
        assert!(!selected.contains(&AgentIdentity::domain("validator-api")));
    }

    #[tokio::test]
    async fn test_select_for_reads_task_text() {
        let task = EvaluationTask::review("story-3", "Set up CI for the billing service")
            .unwrap();
        let selected = strategy().select_for(&task).await.unwrap();
        assert_eq!(selected.len(), 3);
        assert!(selected.contains(&AgentIdentity::feature("validator-payments")));
        assert!(selected.contains(&AgentIdentity::domain("validator-devops")));
    }
}
