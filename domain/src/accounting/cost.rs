//! Token and cost accounting.
//!
//! [`CostAccountant`] is fed finished [`AgentResult`]s after a dispatch
//! completes. It never influences a decision; it only keeps totals.

use super::pricing::PriceTable;
use crate::agent::result::{AgentResult, TokenUsage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running totals for one agent, or overall
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostLine {
    pub invocations: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

impl CostLine {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    fn add(&mut self, usage: &TokenUsage, cost: f64) {
        self.invocations += 1;
        self.input_tokens += usage.input;
        self.output_tokens += usage.output;
        self.cost_usd += cost;
    }
}

/// Snapshot of an accountant's totals
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostSummary {
    /// Totals per agent identity / provider, sorted by name
    pub by_agent: BTreeMap<String, CostLine>,
    pub total: CostLine,
    /// Summed wall-clock time of the evaluated tasks
    pub wall_time_ms: u64,
}

/// Accumulates token counts and estimated cost
#[derive(Debug, Clone, Default)]
pub struct CostAccountant {
    prices: PriceTable,
    by_agent: BTreeMap<String, CostLine>,
    total: CostLine,
    wall_time_ms: u64,
}

impl CostAccountant {
    pub fn new(prices: PriceTable) -> Self {
        Self {
            prices,
            by_agent: BTreeMap::new(),
            total: CostLine::default(),
            wall_time_ms: 0,
        }
    }

    /// Record one finished agent result
    pub fn record(&mut self, result: &AgentResult) {
        self.record_usage(&result.agent.name, &result.usage);
    }

    /// Record raw usage for an agent
    pub fn record_usage(&mut self, agent: &str, usage: &TokenUsage) {
        let cost = self.prices.cost(agent, usage);
        self.by_agent
            .entry(agent.to_string())
            .or_default()
            .add(usage, cost);
        self.total.add(usage, cost);
    }

    /// Add the wall-clock duration of one evaluated task
    pub fn record_wall_time(&mut self, elapsed_ms: u64) {
        self.wall_time_ms += elapsed_ms;
    }

    pub fn total(&self) -> &CostLine {
        &self.total
    }

    pub fn agent(&self, name: &str) -> Option<&CostLine> {
        self.by_agent.get(name)
    }

    pub fn summary(&self) -> CostSummary {
        CostSummary {
            by_agent: self.by_agent.clone(),
            total: self.total,
            wall_time_ms: self.wall_time_ms,
        }
    }
}
