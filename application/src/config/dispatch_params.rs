//! Dispatch parameters: fan-out and retry control.
//!
//! [`DispatchParams`] groups the static parameters that control
//! [`AgentDispatcher`](crate::use_cases::dispatch::AgentDispatcher) and its
//! [`RetryPolicy`](crate::use_cases::retry::RetryPolicy). These are
//! application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fan-out and retry control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchParams {
    /// Maximum number of agents invoked at the same time.
    pub max_concurrency: usize,
    /// Retries after the first invocation, for transient failures only.
    pub max_retries: u32,
    /// Backoff before retry `n` (zero-based) is `base_backoff * 2^(n+1)`.
    pub base_backoff: Duration,
    /// Wall-clock limit for one task's whole dispatch.
    pub task_timeout: Option<Duration>,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
            task_timeout: None,
        }
    }
}

impl DispatchParams {
    // ==================== Builder Methods ====================

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_base_backoff(mut self, base: Duration) -> Self {
        self.base_backoff = base;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Concurrency limit, never below one
    pub fn concurrency_limit(&self) -> usize {
        self.max_concurrency.max(1)
    }
}
