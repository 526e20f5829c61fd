//! Port for structured evaluation logging.
//!
//! Defines the [`EvaluationLogger`] trait for recording evaluation events
//! (agent results, agent failures, final reports) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures what each
//! agent said in a machine-readable format (JSONL).

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A structured evaluation event for logging.
pub struct EvaluationEvent {
    /// Event type identifier (e.g., "agent_result", "agent_failure", "review_report").
    pub event_type: &'static str,
    /// Task the event belongs to.
    pub task_id: String,
    pub timestamp: DateTime<Utc>,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl EvaluationEvent {
    /// Create a new event stamped with the current UTC time.
    pub fn new(event_type: &'static str, task_id: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type,
            task_id: task_id.into(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Port for logging evaluation events to a structured log.
///
/// The `log` method is synchronous and non-fallible; logging failures
/// never interrupt an evaluation.
pub trait EvaluationLogger: Send + Sync {
    fn log(&self, event: EvaluationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoEvaluationLogger;

impl EvaluationLogger for NoEvaluationLogger {
    fn log(&self, _event: EvaluationEvent) {}
}
