//! Application layer for verdict
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::DispatchParams;
pub use ports::{
    agent_invoker::{AgentInvoker, AgentOutput, InvokeError},
    evaluation_logger::{EvaluationEvent, EvaluationLogger, NoEvaluationLogger},
    progress::{NoProgress, ProgressNotifier},
    selection::{
        InMemorySelectionStore, SelectionError, SelectionStore, SelectionStrategy, StoreError,
    },
};
pub use use_cases::dispatch::{AgentDispatcher, DispatchOutcome};
pub use use_cases::evaluate::{
    BatchEntry, EvaluateError, EvaluateUseCase, RecommendationOutcome, ReviewOutcome,
};
pub use use_cases::retry::{Attempted, RetryPolicy};
pub use use_cases::selection_cache::SelectionCache;
