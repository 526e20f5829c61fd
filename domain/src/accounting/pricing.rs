//! Model pricing table

use crate::agent::result::TokenUsage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Price of one model in USD per million tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Model key, matched against agent names (e.g. "sonnet", "gpt-4o")
    pub model: String,
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn new(model: impl Into<String>, input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            model: model.into(),
            input_per_million,
            output_per_million,
        }
    }

    /// Estimated cost of `usage` in USD
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.input as f64 * self.input_per_million
            + usage.output as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

/// Lookup table from agent name to pricing
///
/// An agent with an explicit model mapping is priced as that model.
/// Otherwise an exact (case-insensitive) model match wins, then the longest
/// model key contained in the agent name. Unknown agents are free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    rows: Vec<ModelPricing>,
    /// Lowercased agent name → model key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    agent_models: BTreeMap<String, String>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::new(vec![
            ModelPricing::new("haiku", 0.80, 4.00),
            ModelPricing::new("sonnet", 3.00, 15.00),
            ModelPricing::new("opus", 15.00, 75.00),
            ModelPricing::new("gpt-4o-mini", 0.15, 0.60),
            ModelPricing::new("gpt-4o", 2.50, 10.00),
        ])
    }
}

impl PriceTable {
    pub fn new(rows: Vec<ModelPricing>) -> Self {
        Self {
            rows,
            agent_models: BTreeMap::new(),
        }
    }

    /// A table that prices everything at zero
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Price the named agents as the given models
    ///
    /// Used for agents whose name says nothing about the model behind
    /// them, like `validator-security`.
    pub fn with_agent_models<K, V>(mut self, models: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (agent, model) in models {
            self.agent_models
                .insert(agent.as_ref().trim().to_lowercase(), model.into());
        }
        self
    }

    pub fn rows(&self) -> &[ModelPricing] {
        &self.rows
    }

    pub fn lookup(&self, agent_name: &str) -> Option<&ModelPricing> {
        let lower = agent_name.to_lowercase();
        match self.agent_models.get(&lower) {
            Some(model) => self.lookup_model(model),
            None => self.lookup_model(&lower),
        }
    }

    fn lookup_model(&self, name: &str) -> Option<&ModelPricing> {
        let lower = name.to_lowercase();
        if let Some(exact) = self.rows.iter().find(|r| r.model.to_lowercase() == lower) {
            return Some(exact);
        }
        self.rows
            .iter()
            .filter(|r| !r.model.is_empty() && lower.contains(&r.model.to_lowercase()))
            .max_by_key(|r| r.model.len())
    }

    pub fn cost(&self, agent_name: &str, usage: &TokenUsage) -> f64 {
        self.lookup(agent_name).map(|p| p.cost(usage)).unwrap_or(0.0)
    }
}
