//! Domain layer for verdict
//!
//! This crate contains the core evaluation logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns and
//! performs no I/O.
//!
//! # Core Concepts
//!
//! ## Evaluation round
//!
//! One [`EvaluationTask`] is handed to several independent agents. Each
//! agent's raw output is normalized into an [`AgentResult`]; the set of
//! results is then reduced to a single decision:
//!
//! - **Review mode**: [`aggregate`] builds an [`AggregatedReport`] whose
//!   overall status follows the severity-escalation rule.
//! - **Recommendation mode**: [`ConsensusAnalyzer`] normalizes every
//!   recommendation to a [`Tier`] and reports a [`ConsensusRecord`].
//!
//! Disagreement is an outcome, never an error.

pub mod accounting;
pub mod agent;
pub mod batch;
pub mod config;
pub mod core;
pub mod evaluation;

// Re-export commonly used types
pub use accounting::{CostAccountant, CostLine, CostSummary, ModelPricing, PriceTable};
pub use agent::{
    identity::{AgentCategory, AgentIdentity},
    result::{
        AgentFailure, AgentResult, Confidence, FailureKind, Issue, ReviewStatus, Severity,
        TokenUsage, Verdict,
    },
};
pub use batch::{
    BaselineComparison, BaselineDelta, BatchSummary, ConsensusRate, TaskOutcome, TaskReport,
};
pub use config::{ConfigIssue, ConfigIssueCode, IssueLevel, OutputFormat};
pub use core::{
    error::DomainError,
    task::{EvaluationMode, EvaluationTask},
};
pub use evaluation::{
    AggregatedReport, AgreementLevel, ConsensusAnalyzer, ConsensusRecord, NormalizeError,
    PriorityMention, RawOutput, ResponseNormalizer, TaggedIssue, Tier, TierCount, TierVocabulary,
    aggregate, severity_escalation,
};
