//! Evaluation domain: from raw agent output to one decision.
//!
//! # Pipeline
//!
//! ```text
//! raw output ──▶ ResponseNormalizer ──▶ AgentResult ─┬─▶ aggregate()            ──▶ AggregatedReport
//!  (text/JSON)     (extraction grammar)               └─▶ ConsensusAnalyzer      ──▶ ConsensusRecord
//! ```
//!
//! Everything here is pure and order-independent; dispatching agents and
//! retrying them is the application layer's job.

pub mod aggregator;
pub mod consensus;
pub mod extraction;
pub mod normalizer;
pub mod tier;

pub use aggregator::{AggregatedReport, PriorityMention, TaggedIssue, aggregate};
pub use consensus::{
    AgreementLevel, ConsensusAnalyzer, ConsensusRecord, TierCount, severity_escalation,
};
pub use normalizer::{NormalizeError, RawOutput, ResponseNormalizer};
pub use tier::{Tier, TierVocabulary};
