//! Agent result types
//!
//! An [`AgentResult`] is one agent's verdict on a task. It is created once
//! per dispatch and never mutated afterwards; aggregation and consensus are
//! pure functions over a set of results.

use super::identity::AgentIdentity;
use serde::{Deserialize, Serialize};

/// Review verdict of a single agent, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    Excellent,
    Acceptable,
    NeedsImprovement,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Excellent => "excellent",
            ReviewStatus::Acceptable => "acceptable",
            ReviewStatus::NeedsImprovement => "needs-improvement",
        }
    }

    /// Status implied by a 0-100 score when an agent omits its status
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => ReviewStatus::Excellent,
            70..=89 => ReviewStatus::Acceptable,
            _ => ReviewStatus::NeedsImprovement,
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    /// Lenient: accepts `needs-improvement`, `needs_improvement`, `Needs Improvement`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        match normalized.as_str() {
            "excellent" => Ok(ReviewStatus::Excellent),
            "acceptable" | "good" => Ok(ReviewStatus::Acceptable),
            "needs-improvement" | "needs-work" | "poor" => Ok(ReviewStatus::NeedsImprovement),
            _ => Err(format!("Unknown review status: {}", s.trim())),
        }
    }
}

/// What an agent concluded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Verdict {
    /// Review mode: a status for the artifact
    Review(ReviewStatus),
    /// Recommendation mode: the free-form recommended entity
    Recommendation(String),
}

/// Issue severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Major => "major",
            Severity::Minor => "minor",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" | "blocker" => Ok(Severity::Critical),
            "major" | "high" => Ok(Severity::Major),
            "minor" | "low" | "medium" => Ok(Severity::Minor),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

/// A single issue reported by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    /// Domain tag (e.g. "security"); defaults to the reporting agent's tag
    pub domain: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    pub fn new(
        severity: Severity,
        domain: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            domain: domain.into(),
            description: description.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Self-reported confidence label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl Confidence {
    /// Map a free-form label case-insensitively; anything unrecognized is `Unknown`
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        let word = lower
            .split(|c: char| !c.is_alphanumeric())
            .find(|w| !w.is_empty())
            .unwrap_or("");
        match word {
            "high" => Confidence::High,
            "medium" | "moderate" => Confidence::Medium,
            "low" => Confidence::Low,
            _ => Confidence::Unknown,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
            Confidence::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Token counts reported for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

impl TokenUsage {
    pub fn new(input: u64, output: u64) -> Self {
        Self { input, output }
    }

    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input += rhs.input;
        self.output += rhs.output;
    }
}

/// One agent's canonical verdict on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// The identity that produced this result
    pub agent: AgentIdentity,
    pub verdict: Verdict,
    /// 0-100, independent of the status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub priorities: Vec<String>,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub usage: TokenUsage,
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl AgentResult {
    /// Create a review result with no issues, strengths or score
    pub fn review(agent: AgentIdentity, status: ReviewStatus) -> Self {
        Self::with_verdict(agent, Verdict::Review(status))
    }

    /// Create a recommendation result
    pub fn recommendation(agent: AgentIdentity, entity: impl Into<String>) -> Self {
        Self::with_verdict(agent, Verdict::Recommendation(entity.into()))
    }

    fn with_verdict(agent: AgentIdentity, verdict: Verdict) -> Self {
        Self {
            agent,
            verdict,
            score: None,
            issues: Vec::new(),
            strengths: Vec::new(),
            priorities: Vec::new(),
            confidence: Confidence::Unknown,
            rationale: String::new(),
            usage: TokenUsage::default(),
            elapsed_ms: 0,
        }
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score.min(100));
        self
    }

    pub fn with_issue(mut self, issue: Issue) -> Self {
        self.issues.push(issue);
        self
    }

    pub fn with_strength(mut self, strength: impl Into<String>) -> Self {
        self.strengths.push(strength.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priorities.push(priority.into());
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Review status, if this is a review result
    pub fn status(&self) -> Option<ReviewStatus> {
        match &self.verdict {
            Verdict::Review(status) => Some(*status),
            Verdict::Recommendation(_) => None,
        }
    }

    /// Recommended entity, if this is a recommendation result
    pub fn recommendation_value(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Recommendation(entity) => Some(entity),
            Verdict::Review(_) => None,
        }
    }
}

/// Why an agent produced no usable result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Retriable failure that persisted through every retry
    Transient,
    /// Output could not be normalized, even by fallback extraction
    Malformed,
    /// Non-retriable invocation failure
    Invocation,
    /// Aborted by cancellation or task timeout
    Cancelled,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Transient => "transient",
            FailureKind::Malformed => "malformed",
            FailureKind::Invocation => "invocation",
            FailureKind::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// A recorded per-agent failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    pub agent: AgentIdentity,
    pub kind: FailureKind,
    pub message: String,
    /// Invocations made, including the first one
    pub attempts: u32,
}

impl AgentFailure {
    pub fn new(
        agent: AgentIdentity,
        kind: FailureKind,
        message: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            agent,
            kind,
            message: message.into(),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_status_parse_is_lenient() {
        assert_eq!(
            "Needs Improvement".parse::<ReviewStatus>().ok(),
            Some(ReviewStatus::NeedsImprovement)
        );
        assert_eq!(
            "needs_improvement".parse::<ReviewStatus>().ok(),
            Some(ReviewStatus::NeedsImprovement)
        );
        assert_eq!(
            " EXCELLENT ".parse::<ReviewStatus>().ok(),
            Some(ReviewStatus::Excellent)
        );
        assert!("maybe".parse::<ReviewStatus>().is_err());
    }

    #[test]
    fn test_review_status_from_score() {
        assert_eq!(ReviewStatus::from_score(95), ReviewStatus::Excellent);
        assert_eq!(ReviewStatus::from_score(90), ReviewStatus::Excellent);
        assert_eq!(ReviewStatus::from_score(75), ReviewStatus::Acceptable);
        assert_eq!(ReviewStatus::from_score(40), ReviewStatus::NeedsImprovement);
    }

    #[test]
    fn test_review_status_serde_kebab() {
        let json = serde_json::to_string(&ReviewStatus::NeedsImprovement).unwrap();
        assert_eq!(json, r#""needs-improvement""#);
    }

    #[test]
    fn test_confidence_from_label() {
        assert_eq!(Confidence::from_label("HIGH"), Confidence::High);
        assert_eq!(Confidence::from_label("medium - mostly sure"), Confidence::Medium);
        assert_eq!(Confidence::from_label("**low**"), Confidence::Low);
        assert_eq!(Confidence::from_label("very"), Confidence::Unknown);
        assert_eq!(Confidence::from_label(""), Confidence::Unknown);
    }

    #[test]
    fn test_high_score_with_critical_issue_is_legal() {
        let result = AgentResult::review(AgentIdentity::domain("validator-security"), ReviewStatus::Excellent)
            .with_score(98)
            .with_issue(Issue::new(Severity::Critical, "security", "Plaintext passwords"));
        assert_eq!(result.score, Some(98));
        assert_eq!(result.status(), Some(ReviewStatus::Excellent));
        assert_eq!(result.issues[0].severity, Severity::Critical);
    }

    #[test]
    fn test_score_is_capped() {
        let result = AgentResult::review(AgentIdentity::universal("v"), ReviewStatus::Acceptable)
            .with_score(250);
        assert_eq!(result.score, Some(100));
    }

    #[test]
    fn test_token_usage_total() {
        let mut usage = TokenUsage::new(100, 20);
        usage += TokenUsage::new(5, 5);
        assert_eq!(usage.total(), 130);
    }

    #[test]
    fn test_recommendation_accessors() {
        let result = AgentResult::recommendation(AgentIdentity::provider("a"), "sonnet");
        assert_eq!(result.recommendation_value(), Some("sonnet"));
        assert!(result.status().is_none());
    }
}
