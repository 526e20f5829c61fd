//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent_invoker;
pub mod evaluation_logger;
pub mod progress;
pub mod selection;
