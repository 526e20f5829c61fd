//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dispatch;
pub mod evaluate;
pub mod retry;
pub mod selection_cache;
