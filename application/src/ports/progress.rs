//! Progress notification port
//!
//! Defines the interface for reporting progress while agents run.

use verdict_domain::{AgentIdentity, EvaluationTask};

/// Callback for progress updates during dispatch
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain logs, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called once before any agent is invoked
    fn on_dispatch_start(&self, task: &EvaluationTask, total_agents: usize);

    /// Called when an agent finishes, successfully or not
    fn on_agent_complete(&self, agent: &AgentIdentity, success: bool);

    /// Called after every agent has finished or been cancelled
    fn on_dispatch_complete(&self, task: &EvaluationTask);

    /// Called before a retry backoff sleep
    fn on_agent_retry(&self, _agent: &AgentIdentity, _attempt: u32, _error: &str) {}

    /// Called when a batch moves to its next task
    fn on_batch_progress(&self, _completed: usize, _total: usize) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_dispatch_start(&self, _task: &EvaluationTask, _total_agents: usize) {}
    fn on_agent_complete(&self, _agent: &AgentIdentity, _success: bool) {}
    fn on_dispatch_complete(&self, _task: &EvaluationTask) {}
}
