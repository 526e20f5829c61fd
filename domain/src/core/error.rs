//! Domain error types

use crate::agent::result::AgentFailure;
use thiserror::Error;

/// Domain-level errors
///
/// Disagreement between agents is never an error; it is reported through
/// [`ConsensusRecord`](crate::evaluation::consensus::ConsensusRecord).
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No agents selected for evaluation")]
    NoAgents,

    #[error("All {} agents failed to produce a usable result", .0.len())]
    AllAgentsFailed(Vec<AgentFailure>),

    #[error("Agent selection failed: {0}")]
    AgentSelection(String),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    /// Per-agent failures carried by this error, if any
    pub fn failures(&self) -> &[AgentFailure] {
        match self {
            DomainError::AllAgentsFailed(failures) => failures,
            _ => &[],
        }
    }
}
