//! Evaluation task value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// Which decision rule an evaluation round is reduced with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    /// Domain-specialist reviewers judge an artifact (severity escalation)
    #[default]
    Review,
    /// Providers recommend an entity (tier-frequency majority)
    Recommendation,
}

impl EvaluationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationMode::Review => "review",
            EvaluationMode::Recommendation => "recommendation",
        }
    }
}

impl std::fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EvaluationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "review" => Ok(EvaluationMode::Review),
            "recommendation" | "recommend" => Ok(EvaluationMode::Recommendation),
            other => Err(format!(
                "Unknown evaluation mode: {}. Valid: review, recommendation",
                other
            )),
        }
    }
}

/// Immutable input to one evaluation round (Value Object)
///
/// Every agent dispatched for the round reads the same task; nothing
/// writes to it after construction.
///
/// # Example
///
/// ```
/// use verdict_domain::{EvaluationMode, EvaluationTask};
///
/// let task = EvaluationTask::review("story-42", "As a user I can reset my password")
///     .unwrap()
///     .with_instructions("Check acceptance criteria")
///     .with_work_item("story-42");
///
/// assert_eq!(task.mode(), EvaluationMode::Review);
/// assert_eq!(task.work_item_id(), Some("story-42"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationTask {
    id: String,
    #[serde(default)]
    mode: EvaluationMode,
    subject: String,
    #[serde(default)]
    instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    work_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    baseline: Option<String>,
}

impl EvaluationTask {
    /// Create a task, rejecting an empty id or subject
    pub fn new(
        id: impl Into<String>,
        mode: EvaluationMode,
        subject: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let task = Self {
            id: id.into(),
            mode,
            subject: subject.into(),
            instructions: String::new(),
            work_item_id: None,
            baseline: None,
        };
        task.validate()?;
        Ok(task)
    }

    pub fn review(id: impl Into<String>, subject: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(id, EvaluationMode::Review, subject)
    }

    pub fn recommendation(
        id: impl Into<String>,
        subject: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Self::new(id, EvaluationMode::Recommendation, subject)
    }

    /// Check the invariants a deserialized task must also satisfy
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::InvalidTask("task id cannot be empty".into()));
        }
        if self.subject.trim().is_empty() {
            return Err(DomainError::InvalidTask(format!(
                "task '{}' has an empty subject",
                self.id
            )));
        }
        Ok(())
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_work_item(mut self, work_item_id: impl Into<String>) -> Self {
        self.work_item_id = Some(work_item_id.into());
        self
    }

    pub fn with_baseline(mut self, baseline: impl Into<String>) -> Self {
        self.baseline = Some(baseline.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn work_item_id(&self) -> Option<&str> {
        self.work_item_id.as_deref()
    }

    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    /// Render the prompt sent to an agent: instructions first, then the subject
    pub fn prompt(&self) -> String {
        if self.instructions.trim().is_empty() {
            self.subject.clone()
        } else {
            format!("{}\n\n---\n\n{}", self.instructions.trim(), self.subject)
        }
    }
}
