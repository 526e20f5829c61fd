//! Token and cost accounting.

pub mod cost;
pub mod pricing;

pub use cost::{CostAccountant, CostLine, CostSummary};
pub use pricing::{ModelPricing, PriceTable};
