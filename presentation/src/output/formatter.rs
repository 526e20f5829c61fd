//! Output formatter trait

use verdict_application::{RecommendationOutcome, ReviewOutcome};
use verdict_domain::{BatchSummary, CostSummary, OutputFormat};

/// Trait for formatting evaluation results
pub trait OutputFormatter {
    /// Format a review round
    fn format_review(&self, outcome: &ReviewOutcome) -> String;

    /// Format a recommendation round
    fn format_recommendation(&self, outcome: &RecommendationOutcome) -> String;

    /// Format a batch summary
    fn format_batch(&self, summary: &BatchSummary) -> String;

    /// Format running cost totals
    fn format_cost(&self, cost: &CostSummary) -> String;
}

/// Formatter for the requested output format
pub fn formatter_for(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(super::console::ConsoleFormatter),
        OutputFormat::Json => Box::new(super::json::JsonFormatter),
    }
}
