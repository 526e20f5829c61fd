//! Batch evaluation summary types.
//!
//! A batch evaluates many tasks one at a time. Each task ends as a
//! [`TaskReport`]; [`BatchSummary::new`] folds them with the batch's cost
//! totals into consensus rates and baseline comparison counts.

use crate::accounting::cost::CostSummary;
use crate::agent::result::AgentFailure;
use crate::core::task::EvaluationMode;
use crate::evaluation::aggregator::AggregatedReport;
use crate::evaluation::consensus::{AgreementLevel, ConsensusRecord};
use crate::evaluation::tier::{Tier, TierVocabulary};
use serde::{Deserialize, Serialize};

/// How a task's majority recommendation relates to a supplied baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineDelta {
    /// Majority tier ranks above the baseline
    Upgrade,
    /// Majority tier ranks below the baseline
    Downgrade,
    Match,
}

impl BaselineDelta {
    /// Compare a majority tier against a baseline entity
    ///
    /// Returns `None` when either side normalizes to an unknown tier.
    pub fn compare(vocabulary: &TierVocabulary, baseline: &str, majority: &Tier) -> Option<Self> {
        let baseline_rank = vocabulary.rank(baseline)?;
        let majority_rank = majority.rank?;
        Some(match majority_rank.cmp(&baseline_rank) {
            std::cmp::Ordering::Greater => BaselineDelta::Upgrade,
            std::cmp::Ordering::Less => BaselineDelta::Downgrade,
            std::cmp::Ordering::Equal => BaselineDelta::Match,
        })
    }
}

/// Final state of one task in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum TaskOutcome {
    Review {
        report: AggregatedReport,
        failures: Vec<AgentFailure>,
    },
    Recommendation {
        record: ConsensusRecord,
        failures: Vec<AgentFailure>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        baseline: Option<BaselineDelta>,
    },
    /// The task produced no usable data (selection error, all agents failed, ...)
    Failed {
        error: String,
        failures: Vec<AgentFailure>,
    },
}

impl TaskOutcome {
    pub fn failures(&self) -> &[AgentFailure] {
        match self {
            TaskOutcome::Review { failures, .. }
            | TaskOutcome::Recommendation { failures, .. }
            | TaskOutcome::Failed { failures, .. } => failures,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TaskOutcome::Failed { .. })
    }
}

/// One task's entry in a batch summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub task_id: String,
    pub mode: EvaluationMode,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
}

/// Fraction of recommendation tasks at each agreement level
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsensusRate {
    pub full: f64,
    pub partial: f64,
    pub none: f64,
    pub single: f64,
    /// Recommendation tasks counted (the denominator)
    pub tasks: usize,
}

impl ConsensusRate {
    pub fn from_levels<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = AgreementLevel>,
    {
        let (mut full, mut partial, mut none, mut single) = (0usize, 0usize, 0usize, 0usize);
        for level in levels {
            match level {
                AgreementLevel::Full => full += 1,
                AgreementLevel::Partial => partial += 1,
                AgreementLevel::None => none += 1,
                AgreementLevel::Single => single += 1,
            }
        }
        let tasks = full + partial + none + single;
        if tasks == 0 {
            return Self::default();
        }
        let ratio = |n: usize| n as f64 / tasks as f64;
        Self {
            full: ratio(full),
            partial: ratio(partial),
            none: ratio(none),
            single: ratio(single),
            tasks,
        }
    }

    pub fn rate(&self, level: AgreementLevel) -> f64 {
        match level {
            AgreementLevel::Full => self.full,
            AgreementLevel::Partial => self.partial,
            AgreementLevel::None => self.none,
            AgreementLevel::Single => self.single,
        }
    }
}

/// Baseline comparison counts across a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub upgrades: usize,
    pub downgrades: usize,
    pub matches: usize,
}

impl BaselineComparison {
    pub fn record(&mut self, delta: BaselineDelta) {
        match delta {
            BaselineDelta::Upgrade => self.upgrades += 1,
            BaselineDelta::Downgrade => self.downgrades += 1,
            BaselineDelta::Match => self.matches += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.upgrades + self.downgrades + self.matches
    }
}

/// Result of evaluating a batch of tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub tasks: Vec<TaskReport>,
    pub cost: CostSummary,
    pub consensus_rate: ConsensusRate,
    pub baseline: BaselineComparison,
    pub failed_tasks: usize,
}

impl BatchSummary {
    pub fn new(tasks: Vec<TaskReport>, cost: CostSummary) -> Self {
        let consensus_rate = ConsensusRate::from_levels(tasks.iter().filter_map(|t| {
            match &t.outcome {
                TaskOutcome::Recommendation { record, .. } => Some(record.level),
                _ => None,
            }
        }));

        let mut baseline = BaselineComparison::default();
        for task in &tasks {
            if let TaskOutcome::Recommendation {
                baseline: Some(delta),
                ..
            } = &task.outcome
            {
                baseline.record(*delta);
            }
        }

        let failed_tasks = tasks.iter().filter(|t| t.outcome.is_failed()).count();

        Self {
            tasks,
            cost,
            consensus_rate,
            baseline,
            failed_tasks,
        }
    }

    pub fn succeeded_tasks(&self) -> usize {
        self.tasks.len() - self.failed_tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::identity::AgentIdentity;
    use crate::agent::result::AgentResult;
    use crate::evaluation::consensus::ConsensusAnalyzer;

    fn record(entities: &[&str]) -> ConsensusRecord {
        let results: Vec<_> = entities
            .iter()
            .enumerate()
            .map(|(i, e)| AgentResult::recommendation(AgentIdentity::provider(format!("p{}", i)), *e))
            .collect();
        ConsensusAnalyzer::default().analyze(&results)
    }

    fn recommendation_task(id: &str, entities: &[&str], baseline: Option<&str>) -> TaskReport {
        let record = record(entities);
        let vocab = TierVocabulary::default();
        let delta = baseline.and_then(|b| {
            record
                .majority
                .as_ref()
                .and_then(|m| BaselineDelta::compare(&vocab, b, m))
        });
        TaskReport {
            task_id: id.to_string(),
            mode: EvaluationMode::Recommendation,
            elapsed_ms: 10,
            outcome: TaskOutcome::Recommendation {
                record,
                failures: vec![],
                baseline: delta,
            },
        }
    }

    #[test]
    fn test_baseline_delta() {
        let vocab = TierVocabulary::default();
        let opus = vocab.normalize("opus");
        let haiku = vocab.normalize("haiku");
        assert_eq!(BaselineDelta::compare(&vocab, "sonnet", &opus), Some(BaselineDelta::Upgrade));
        assert_eq!(BaselineDelta::compare(&vocab, "sonnet", &haiku), Some(BaselineDelta::Downgrade));
        assert_eq!(BaselineDelta::compare(&vocab, "claude-opus", &opus), Some(BaselineDelta::Match));
        assert_eq!(BaselineDelta::compare(&vocab, "gpt-4o", &opus), None);
        assert_eq!(BaselineDelta::compare(&vocab, "opus", &Tier::unknown()), None);
    }

    #[test]
    fn test_consensus_rate_fractions() {
        let rate = ConsensusRate::from_levels([
            AgreementLevel::Full,
            AgreementLevel::Full,
            AgreementLevel::Partial,
            AgreementLevel::None,
        ]);
        assert_eq!(rate.tasks, 4);
        assert_eq!(rate.full, 0.5);
        assert_eq!(rate.rate(AgreementLevel::Partial), 0.25);
        assert_eq!(rate.single, 0.0);

        assert_eq!(
            ConsensusRate::from_levels(std::iter::empty()),
            ConsensusRate::default()
        );
    }

    #[test]
    fn test_batch_summary_counts() {
        let tasks = vec![
            recommendation_task("t1", &["sonnet", "sonnet", "opus"], Some("haiku")),
            recommendation_task("t2", &["haiku", "haiku"], Some("sonnet")),
            recommendation_task("t3", &["opus"], Some("opus")),
            TaskReport {
                task_id: "t4".into(),
                mode: EvaluationMode::Recommendation,
                elapsed_ms: 5,
                outcome: TaskOutcome::Failed {
                    error: "All 2 agents failed to produce a usable result".into(),
                    failures: vec![],
                },
            },
        ];

        let summary = BatchSummary::new(tasks, CostSummary::default());

        assert_eq!(summary.failed_tasks, 1);
        assert_eq!(summary.succeeded_tasks(), 3);
        assert_eq!(summary.consensus_rate.tasks, 3);
        assert!((summary.consensus_rate.partial - 1.0 / 3.0).abs() < 1e-9);
        assert!((summary.consensus_rate.full - 1.0 / 3.0).abs() < 1e-9);
        assert!((summary.consensus_rate.single - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.baseline.upgrades, 1);
        assert_eq!(summary.baseline.downgrades, 1);
        assert_eq!(summary.baseline.matches, 1);
        assert_eq!(summary.baseline.total(), 3);
    }
}
