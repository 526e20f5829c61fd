//! JSON output for scripting

use crate::output::formatter::OutputFormatter;
use serde::Serialize;
use verdict_application::{RecommendationOutcome, ReviewOutcome};
use verdict_domain::{BatchSummary, CostSummary};

/// Formats results as pretty-printed JSON
pub struct JsonFormatter;

impl JsonFormatter {
    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_review(&self, outcome: &ReviewOutcome) -> String {
        Self::to_json(outcome)
    }

    fn format_recommendation(&self, outcome: &RecommendationOutcome) -> String {
        Self::to_json(outcome)
    }

    fn format_batch(&self, summary: &BatchSummary) -> String {
        Self::to_json(summary)
    }

    fn format_cost(&self, cost: &CostSummary) -> String {
        Self::to_json(cost)
    }
}
