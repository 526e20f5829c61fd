//! Agent selection adapters.
//!
//! - [`JsonSelectionStore`]: persists selections in one JSON file
//! - [`StaticSelectionStrategy`]: keyword-table selection

mod json_store;
mod static_strategy;

pub use json_store::JsonSelectionStore;
pub use static_strategy::{StaticSelectionStrategy, ValidatorRule};
