//! Aggregation of review results into one [`AggregatedReport`].

use super::consensus::severity_escalation;
use crate::agent::result::{AgentResult, Issue, ReviewStatus, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of improvement priorities kept in a report
pub const TOP_PRIORITIES: usize = 5;

/// An issue tagged with the agent that reported it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedIssue {
    /// Reporting agent name
    pub agent: String,
    /// Domain extracted from the reporting agent's identity
    pub domain: String,
    pub issue: Issue,
}

/// An improvement priority with how many times it was mentioned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityMention {
    pub priority: String,
    pub mentions: usize,
}

/// Combined view of a set of review results
///
/// Derived on demand and never persisted; recompute instead of mutating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub validator_count: usize,
    /// Rounded mean of the scores present; `None` when nobody scored
    pub average_score: Option<u8>,
    pub strengths: Vec<String>,
    pub critical_issues: Vec<TaggedIssue>,
    pub major_issues: Vec<TaggedIssue>,
    pub minor_issues: Vec<TaggedIssue>,
    /// Top priorities by descending mention count
    pub improvement_priorities: Vec<PriorityMention>,
    pub overall_status: ReviewStatus,
}

impl AggregatedReport {
    pub fn issues(&self, severity: Severity) -> &[TaggedIssue] {
        match severity {
            Severity::Critical => &self.critical_issues,
            Severity::Major => &self.major_issues,
            Severity::Minor => &self.minor_issues,
        }
    }

    pub fn total_issues(&self) -> usize {
        self.critical_issues.len() + self.major_issues.len() + self.minor_issues.len()
    }

    /// Whether the artifact can be published as-is
    pub fn is_publishable(&self) -> bool {
        self.overall_status != ReviewStatus::NeedsImprovement
    }
}

/// Merge review results into an [`AggregatedReport`]
///
/// The output does not depend on the order of `results`, except that lists
/// (issues, strengths, equal-count priorities) keep first-seen order.
pub fn aggregate(results: &[AgentResult]) -> AggregatedReport {
    let mut critical_issues = Vec::new();
    let mut major_issues = Vec::new();
    let mut minor_issues = Vec::new();

    for result in results {
        for issue in &result.issues {
            let tagged = TaggedIssue {
                agent: result.agent.name.clone(),
                domain: result.agent.domain_tag().to_string(),
                issue: issue.clone(),
            };
            match issue.severity {
                Severity::Critical => critical_issues.push(tagged),
                Severity::Major => major_issues.push(tagged),
                Severity::Minor => minor_issues.push(tagged),
            }
        }
    }

    AggregatedReport {
        validator_count: results.len(),
        average_score: average_score(results),
        strengths: dedup_strengths(results.iter().flat_map(|r| r.strengths.iter())),
        critical_issues,
        major_issues,
        minor_issues,
        improvement_priorities: rank_priorities(results, TOP_PRIORITIES),
        overall_status: severity_escalation(results),
    }
}

/// Rounded mean of present scores; missing scores are excluded, not zero
pub fn average_score(results: &[AgentResult]) -> Option<u8> {
    let scores: Vec<f64> = results.iter().filter_map(|r| r.score).map(f64::from).collect();
    if scores.is_empty() {
        return None;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    Some(mean.round() as u8)
}

/// Containment-based strength deduplication
///
/// A strength is dropped when it contains, or is contained in, a strength
/// already kept (case-insensitive). Blank strings are dropped.
pub fn dedup_strengths<'a, I>(strengths: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut kept: Vec<String> = Vec::new();
    let mut kept_lower: Vec<String> = Vec::new();

    for strength in strengths {
        let trimmed = strength.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();
        let overlaps = kept_lower
            .iter()
            .any(|k| k.contains(lower.as_str()) || lower.contains(k.as_str()));
        if !overlaps {
            kept.push(trimmed.to_string());
            kept_lower.push(lower);
        }
    }

    kept
}

/// Count literal priority strings and keep the top `limit`
///
/// Ties keep first-mention order.
pub fn rank_priorities(results: &[AgentResult], limit: usize) -> Vec<PriorityMention> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for priority in results.iter().flat_map(|r| r.priorities.iter()) {
        let priority = priority.trim();
        if priority.is_empty() {
            continue;
        }
        let count = counts.entry(priority).or_insert(0);
        if *count == 0 {
            order.push(priority);
        }
        *count += 1;
    }

    let mut ranked: Vec<PriorityMention> = order
        .into_iter()
        .map(|p| PriorityMention {
            priority: p.to_string(),
            mentions: counts[p],
        })
        .collect();
    // Stable sort keeps first-mention order among equal counts
    ranked.sort_by(|a, b| b.mentions.cmp(&a.mentions));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::identity::AgentIdentity;

    fn review(name: &str, status: ReviewStatus, score: u8) -> AgentResult {
        AgentResult::review(AgentIdentity::domain(name), status).with_score(score)
    }

    #[test]
    fn test_scenario_scores_and_escalation() {
        let results = vec![
            review("validator-api", ReviewStatus::Excellent, 90),
            review("validator-ux", ReviewStatus::Acceptable, 85),
            review("validator-security", ReviewStatus::NeedsImprovement, 40),
        ];
        let report = aggregate(&results);

        assert_eq!(report.validator_count, 3);
        assert_eq!(report.average_score, Some(72));
        assert_eq!(report.overall_status, ReviewStatus::NeedsImprovement);
        assert!(!report.is_publishable());
    }

    #[test]
    fn test_high_average_never_overrides_escalation() {
        let results = vec![
            review("a", ReviewStatus::Excellent, 100),
            review("b", ReviewStatus::Excellent, 100),
            review("c", ReviewStatus::NeedsImprovement, 100),
        ];
        let report = aggregate(&results);
        assert_eq!(report.average_score, Some(100));
        assert_eq!(report.overall_status, ReviewStatus::NeedsImprovement);
    }

    #[test]
    fn test_missing_scores_are_excluded() {
        let results = vec![
            review("a", ReviewStatus::Acceptable, 80),
            AgentResult::review(AgentIdentity::domain("b"), ReviewStatus::Acceptable),
        ];
        assert_eq!(average_score(&results), Some(80));
        assert_eq!(
            average_score(&[AgentResult::review(
                AgentIdentity::domain("b"),
                ReviewStatus::Acceptable
            )]),
            None
        );
    }

    #[test]
    fn test_issues_partitioned_and_tagged() {
        let results = vec![
            review("validator-security", ReviewStatus::NeedsImprovement, 50)
                .with_issue(Issue::new(Severity::Critical, "security", "No auth"))
                .with_issue(Issue::new(Severity::Minor, "security", "Verbose errors")),
            review("api-validator", ReviewStatus::Acceptable, 75)
                .with_issue(Issue::new(Severity::Major, "rest", "No pagination")),
        ];
        let report = aggregate(&results);

        assert_eq!(report.critical_issues.len(), 1);
        assert_eq!(report.major_issues.len(), 1);
        assert_eq!(report.minor_issues.len(), 1);
        assert_eq!(report.total_issues(), 3);
        assert_eq!(report.critical_issues[0].agent, "validator-security");
        assert_eq!(report.major_issues[0].domain, "api");
        assert_eq!(report.major_issues[0].issue.domain, "rest");
        assert_eq!(report.issues(Severity::Minor)[0].issue.description, "Verbose errors");
    }

    #[test]
    fn test_dedup_strengths_containment() {
        let strengths: Vec<String> = vec![
            "Clear acceptance criteria".into(),
            "clear acceptance criteria for login".into(),
            "Acceptance criteria".into(),
            "Good test coverage".into(),
            "  ".into(),
        ];
        let kept = dedup_strengths(strengths.iter());
        assert_eq!(kept, vec!["Clear acceptance criteria", "Good test coverage"]);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let strengths: Vec<String> = vec![
            "Scope is small".into(),
            "scope".into(),
            "Naming is consistent".into(),
        ];
        let once = dedup_strengths(strengths.iter());
        let twice = dedup_strengths(once.iter());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_substring_strength_does_not_grow_count() {
        let mut strengths: Vec<String> = vec!["Well-defined API contract".into()];
        let before = dedup_strengths(strengths.iter()).len();
        strengths.push("api contract".into());
        assert_eq!(dedup_strengths(strengths.iter()).len(), before);
    }

    #[test]
    fn test_rank_priorities_top_five() {
        let a = review("a", ReviewStatus::Acceptable, 80)
            .with_priority("Add tests")
            .with_priority("Split story")
            .with_priority("Document API");
        let b = review("b", ReviewStatus::Acceptable, 80)
            .with_priority("Add tests")
            .with_priority("Document API")
            .with_priority("Rename fields")
            .with_priority("Add metrics")
            .with_priority("Cache lookups");
        let c = review("c", ReviewStatus::Acceptable, 80).with_priority("Add tests");

        let ranked = rank_priorities(&[a, b, c], TOP_PRIORITIES);

        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].priority, "Add tests");
        assert_eq!(ranked[0].mentions, 3);
        assert_eq!(ranked[1].priority, "Document API");
        assert_eq!(ranked[1].mentions, 2);
        // Ties keep first-mention order
        assert_eq!(ranked[2].priority, "Split story");
        assert_eq!(ranked[3].priority, "Rename fields");
        assert_eq!(ranked[4].priority, "Add metrics");
    }

    #[test]
    fn test_partial_survivors_aggregate() {
        // Two survivors of a three-agent dispatch
        let results = vec![
            review("a", ReviewStatus::Excellent, 95),
            review("b", ReviewStatus::Excellent, 91),
        ];
        let report = aggregate(&results);
        assert_eq!(report.validator_count, 2);
        assert_eq!(report.average_score, Some(93));
        assert_eq!(report.overall_status, ReviewStatus::Excellent);
        assert!(report.is_publishable());
    }
}
