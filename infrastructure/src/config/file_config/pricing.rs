//! Price table from TOML (`[[pricing]]` array)
//!
//! ```toml
//! [[pricing]]
//! model = "sonnet"
//! input_per_million = 3.0
//! output_per_million = 15.0
//! ```
//!
//! Agent names are matched against `model` exactly first, then by the
//! longest `model` contained in the name. With no rows at all the built-in
//! table is used.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use verdict_domain::{ConfigIssue, ConfigIssueCode, ModelPricing, PriceTable};

/// One `[[pricing]]` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePricingRow {
    pub model: String,
    /// USD per million input tokens
    pub input_per_million: f64,
    /// USD per million output tokens
    pub output_per_million: f64,
}

/// Build a [`PriceTable`] from `[[pricing]]` rows
///
/// Rows with a negative or non-finite price are skipped; a repeated model
/// keeps its first row.
pub fn to_price_table(rows: &[FilePricingRow]) -> (PriceTable, Vec<ConfigIssue>) {
    if rows.is_empty() {
        return (PriceTable::default(), Vec::new());
    }

    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let mut prices = Vec::new();

    for row in rows {
        let key = row.model.trim().to_lowercase();
        let valid = |p: f64| p.is_finite() && p >= 0.0;
        if key.is_empty() || !valid(row.input_per_million) || !valid(row.output_per_million) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidPrice {
                    model: row.model.clone(),
                },
                format!("pricing row '{}' is invalid and was ignored", row.model),
            ));
            continue;
        }
        if !seen.insert(key) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::DuplicatePricing {
                    model: row.model.clone(),
                },
                format!(
                    "pricing for '{}' is defined more than once, keeping the first row",
                    row.model
                ),
            ));
            continue;
        }
        prices.push(ModelPricing::new(
            row.model.trim(),
            row.input_per_million,
            row.output_per_million,
        ));
    }

    (PriceTable::new(prices), issues)
}
