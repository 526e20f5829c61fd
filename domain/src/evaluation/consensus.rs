//! Consensus analysis over a set of [`AgentResult`]s.
//!
//! Two decision rules, selected by evaluation mode:
//!
//! | Rule | Mode | Output |
//! |------|------|--------|
//! | [`severity_escalation`] | review | overall [`ReviewStatus`] |
//! | [`ConsensusAnalyzer::analyze`] | recommendation | [`ConsensusRecord`] |
//!
//! Both are pure functions of the result set and independent of its order,
//! with one documented exception: the tier tie-break.

use super::tier::{Tier, TierVocabulary};
use crate::agent::result::{AgentResult, ReviewStatus};
use serde::{Deserialize, Serialize};

/// Severity-escalation rule
///
/// `needs-improvement` if any agent says so, `excellent` only if every
/// agent says so, `acceptable` otherwise. The average score plays no part.
/// Results without a review status are ignored; no statuses at all yields
/// `acceptable`.
pub fn severity_escalation(results: &[AgentResult]) -> ReviewStatus {
    let mut statuses = results.iter().filter_map(AgentResult::status).peekable();
    if statuses.peek().is_none() {
        return ReviewStatus::Acceptable;
    }

    let mut all_excellent = true;
    for status in statuses {
        match status {
            ReviewStatus::NeedsImprovement => return ReviewStatus::NeedsImprovement,
            ReviewStatus::Excellent => {}
            ReviewStatus::Acceptable => all_excellent = false,
        }
    }

    if all_excellent {
        ReviewStatus::Excellent
    } else {
        ReviewStatus::Acceptable
    }
}

/// Degree of agreement among normalized recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementLevel {
    /// Every participant's tier matches
    Full,
    /// The majority tier covers at least half the participants
    Partial,
    /// No tier reaches half
    None,
    /// Exactly one participant
    Single,
}

impl AgreementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgreementLevel::Full => "full",
            AgreementLevel::Partial => "partial",
            AgreementLevel::None => "none",
            AgreementLevel::Single => "single",
        }
    }
}

impl std::fmt::Display for AgreementLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Votes for one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCount {
    pub tier: Tier,
    pub votes: usize,
    /// Agents that voted for this tier
    pub agents: Vec<String>,
}

/// Outcome of the tier-frequency majority rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    pub level: AgreementLevel,
    /// Majority tier; `None` when nobody participated
    pub majority: Option<Tier>,
    /// Votes for the majority tier
    pub support: usize,
    pub participants: usize,
    /// Every tier with its votes, in order of first appearance
    pub distribution: Vec<TierCount>,
}

impl ConsensusRecord {
    /// Majority tier name, if any
    pub fn majority_name(&self) -> Option<&str> {
        self.majority.as_ref().map(|t| t.name.as_str())
    }

    /// Support as a fraction string, e.g. "2/3"
    pub fn agreement(&self) -> String {
        format!("{}/{}", self.support, self.participants)
    }

    /// Support ratio (0.0 to 1.0)
    pub fn agreement_ratio(&self) -> f64 {
        if self.participants == 0 {
            0.0
        } else {
            self.support as f64 / self.participants as f64
        }
    }

    /// Generate a visual vote summary (e.g., "[●●○]")
    pub fn vote_summary(&self) -> String {
        let mut summary = String::from("[");
        for count in &self.distribution {
            let is_majority = self.majority.as_ref() == Some(&count.tier);
            for _ in 0..count.votes {
                summary.push(if is_majority { '●' } else { '○' });
            }
        }
        summary.push(']');
        summary
    }
}

/// Applies the tier-frequency majority rule
#[derive(Debug, Clone, Default)]
pub struct ConsensusAnalyzer {
    vocabulary: TierVocabulary,
}

impl ConsensusAnalyzer {
    pub fn new(vocabulary: TierVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &TierVocabulary {
        &self.vocabulary
    }

    /// Compute the consensus record for recommendation results
    ///
    /// Results without a recommendation are not participants.
    ///
    /// Tie-break: when several tiers share the top vote count, the tier
    /// encountered first while iterating `results` wins. This is arbitrary
    /// (it depends on completion order) and carries no meaning beyond being
    /// deterministic for a given slice.
    pub fn analyze(&self, results: &[AgentResult]) -> ConsensusRecord {
        let mut distribution: Vec<TierCount> = Vec::new();

        for result in results {
            let Some(entity) = result.recommendation_value() else {
                continue;
            };
            let tier = self.vocabulary.normalize(entity);
            match distribution.iter_mut().find(|c| c.tier == tier) {
                Some(count) => {
                    count.votes += 1;
                    count.agents.push(result.agent.name.clone());
                }
                None => distribution.push(TierCount {
                    tier,
                    votes: 1,
                    agents: vec![result.agent.name.clone()],
                }),
            }
        }

        let participants: usize = distribution.iter().map(|c| c.votes).sum();

        // Strict `>` keeps the earliest tier on ties
        let mut majority: Option<&TierCount> = None;
        for count in &distribution {
            if majority.is_none_or(|m| count.votes > m.votes) {
                majority = Some(count);
            }
        }
        let support = majority.map(|m| m.votes).unwrap_or(0);
        let majority = majority.map(|m| m.tier.clone());

        let level = match participants {
            0 => AgreementLevel::None,
            1 => AgreementLevel::Single,
            n if support == n => AgreementLevel::Full,
            n if support >= n.div_ceil(2) => AgreementLevel::Partial,
            _ => AgreementLevel::None,
        };

        ConsensusRecord {
            level,
            majority,
            support,
            participants,
            distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::identity::AgentIdentity;

    fn review(name: &str, status: ReviewStatus) -> AgentResult {
        AgentResult::review(AgentIdentity::domain(name), status)
    }

    fn recommend(name: &str, entity: &str) -> AgentResult {
        AgentResult::recommendation(AgentIdentity::provider(name), entity)
    }

    // ==================== Severity escalation ====================

    #[test]
    fn test_any_needs_improvement_dominates() {
        let results = vec![
            review("a", ReviewStatus::Excellent).with_score(100),
            review("b", ReviewStatus::Excellent).with_score(100),
            review("c", ReviewStatus::NeedsImprovement).with_score(99),
        ];
        assert_eq!(severity_escalation(&results), ReviewStatus::NeedsImprovement);
    }

    #[test]
    fn test_all_excellent() {
        let results = vec![
            review("a", ReviewStatus::Excellent),
            review("b", ReviewStatus::Excellent),
        ];
        assert_eq!(severity_escalation(&results), ReviewStatus::Excellent);
    }

    #[test]
    fn test_mixed_is_acceptable() {
        let results = vec![
            review("a", ReviewStatus::Excellent),
            review("b", ReviewStatus::Acceptable),
        ];
        assert_eq!(severity_escalation(&results), ReviewStatus::Acceptable);

        let results = vec![review("a", ReviewStatus::Acceptable)];
        assert_eq!(severity_escalation(&results), ReviewStatus::Acceptable);
    }

    #[test]
    fn test_escalation_is_order_independent() {
        let mut results = vec![
            review("a", ReviewStatus::NeedsImprovement),
            review("b", ReviewStatus::Excellent),
            review("c", ReviewStatus::Acceptable),
        ];
        let forward = severity_escalation(&results);
        results.reverse();
        assert_eq!(forward, severity_escalation(&results));
    }

    #[test]
    fn test_escalation_without_statuses() {
        assert_eq!(severity_escalation(&[]), ReviewStatus::Acceptable);
        assert_eq!(
            severity_escalation(&[recommend("a", "opus")]),
            ReviewStatus::Acceptable
        );
    }

    // ==================== Tier majority ====================

    #[test]
    fn test_partial_consensus_two_of_three() {
        let results = vec![
            recommend("a", "sonnet"),
            recommend("b", "sonnet"),
            recommend("c", "opus"),
        ];
        let record = ConsensusAnalyzer::default().analyze(&results);

        assert_eq!(record.level, AgreementLevel::Partial);
        assert_eq!(record.majority_name(), Some("sonnet"));
        assert_eq!(record.support, 2);
        assert_eq!(record.agreement(), "2/3");
        assert_eq!(record.distribution.len(), 2);
        assert_eq!(record.vote_summary(), "[●●○]");
    }

    #[test]
    fn test_full_consensus_after_normalization() {
        let results = vec![
            recommend("a", "claude-3-5-sonnet"),
            recommend("b", "Sonnet 4"),
        ];
        let record = ConsensusAnalyzer::default().analyze(&results);
        assert_eq!(record.level, AgreementLevel::Full);
        assert_eq!(record.agreement_ratio(), 1.0);
    }

    #[test]
    fn test_single_participant() {
        let record = ConsensusAnalyzer::default().analyze(&[recommend("a", "haiku")]);
        assert_eq!(record.level, AgreementLevel::Single);
        assert_eq!(record.support, 1);
    }

    #[test]
    fn test_no_majority() {
        let results = vec![
            recommend("a", "haiku"),
            recommend("b", "sonnet"),
            recommend("c", "opus"),
        ];
        let record = ConsensusAnalyzer::default().analyze(&results);
        assert_eq!(record.level, AgreementLevel::None);
        assert_eq!(record.support, 1);
    }

    #[test]
    fn test_half_support_is_partial() {
        let results = vec![
            recommend("a", "opus"),
            recommend("b", "opus"),
            recommend("c", "haiku"),
            recommend("d", "sonnet"),
        ];
        let record = ConsensusAnalyzer::default().analyze(&results);
        assert_eq!(record.level, AgreementLevel::Partial);
        assert_eq!(record.majority_name(), Some("opus"));
    }

    #[test]
    fn test_tie_break_first_encountered() {
        let results = vec![recommend("a", "opus"), recommend("b", "haiku")];
        let record = ConsensusAnalyzer::default().analyze(&results);
        assert_eq!(record.majority_name(), Some("opus"));
        assert_eq!(record.level, AgreementLevel::Partial);

        let reversed = vec![recommend("b", "haiku"), recommend("a", "opus")];
        let record = ConsensusAnalyzer::default().analyze(&reversed);
        assert_eq!(record.majority_name(), Some("haiku"));
    }

    #[test]
    fn test_unknown_tier_participates() {
        let results = vec![recommend("a", "gpt-4o"), recommend("b", "gemini")];
        let record = ConsensusAnalyzer::default().analyze(&results);
        assert_eq!(record.level, AgreementLevel::Full);
        assert!(record.majority.unwrap().is_unknown());
    }

    #[test]
    fn test_no_participants() {
        let record = ConsensusAnalyzer::default().analyze(&[review("a", ReviewStatus::Excellent)]);
        assert_eq!(record.level, AgreementLevel::None);
        assert_eq!(record.participants, 0);
        assert!(record.majority.is_none());
    }
}
