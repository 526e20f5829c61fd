//! Batch evaluation summaries.

pub mod summary;

pub use summary::{
    BaselineComparison, BaselineDelta, BatchSummary, ConsensusRate, TaskOutcome, TaskReport,
};
