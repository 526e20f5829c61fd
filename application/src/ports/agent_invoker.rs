//! Agent invoker port
//!
//! Defines the interface for running one agent against one task.

use async_trait::async_trait;
use thiserror::Error;
use verdict_domain::{AgentIdentity, EvaluationTask, RawOutput, TokenUsage};

/// Errors that can occur while invoking an agent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(String),
}

impl InvokeError {
    /// Whether a retry might succeed
    ///
    /// Rate limits, timeouts and server-side overload are retriable. Other
    /// failures are classified by their message text, since most invokers
    /// only see a provider's error string.
    pub fn is_transient(&self) -> bool {
        match self {
            InvokeError::RateLimited(_) | InvokeError::ServerError(_) | InvokeError::Timeout => {
                true
            }
            InvokeError::Cancelled => false,
            InvokeError::ConnectionError(msg)
            | InvokeError::RequestFailed(msg)
            | InvokeError::Other(msg) => is_transient_message(msg),
        }
    }
}

const TRANSIENT_MARKERS: &[&str] = &[
    "rate limit",
    "rate-limit",
    "ratelimit",
    "too many requests",
    "timeout",
    "timed out",
    "overloaded",
    "service unavailable",
    "bad gateway",
    "gateway timeout",
    "internal server error",
];

/// Retriable HTTP status codes
const TRANSIENT_STATUS_CODES: &[&str] = &["429", "500", "502", "503", "504"];

/// Words that mark a following number as an HTTP status
const STATUS_CONTEXT: &[&str] = &[
    "http", "status", "code", "error", "returned", "response", "got", "received",
];

/// Classify a provider error message as retriable
pub fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
        return true;
    }

    // A status code only counts right after a status word; version numbers
    // like the `1.1` in `HTTP/1.1 503` are skipped when looking back
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.iter().enumerate().any(|(i, token)| {
        TRANSIENT_STATUS_CODES.contains(token)
            && tokens[..i]
                .iter()
                .rev()
                .find(|t| !t.bytes().all(|b| b.is_ascii_digit()))
                .is_some_and(|word| STATUS_CONTEXT.contains(word))
    })
}

/// Output of a successful invocation
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput {
    pub raw: RawOutput,
    pub usage: TokenUsage,
}

impl AgentOutput {
    pub fn new(raw: RawOutput) -> Self {
        Self {
            raw,
            usage: TokenUsage::default(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(RawOutput::text(text))
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }
}

/// Runs one agent against one task
///
/// This is the only place the engine touches a model provider. Adapters
/// live in the infrastructure layer.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(
        &self,
        task: &EvaluationTask,
        agent: &AgentIdentity,
    ) -> Result<AgentOutput, InvokeError>;
}
