//! Core domain concepts shared across all subdomains.
//!
//! - [`task::EvaluationTask`]: the shared input of one evaluation round
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod task;
