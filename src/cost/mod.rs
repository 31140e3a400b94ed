//! Token cost accounting
//!
//! Prices are per 1000 tokens. Cost tracking is best effort: a model with
//! no price entry costs nothing and only produces a warning.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::types::UsageRecord;

/// Price of one model, per 1000 tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl ModelPricing {
    pub fn new(prompt_per_1k: f64, completion_per_1k: f64) -> Self {
        Self {
            prompt_per_1k,
            completion_per_1k,
        }
    }
}

/// Model identifier -> pricing
#[derive(Debug, Clone)]
pub struct CostTable {
    prices: HashMap<String, ModelPricing>,
}

impl CostTable {
    /// Table without any known model
    pub fn empty() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    /// Add or replace the price of a model
    pub fn with_pricing(mut self, model: impl Into<String>, pricing: ModelPricing) -> Self {
        self.insert(model, pricing);
        self
    }

    pub fn insert(&mut self, model: impl Into<String>, pricing: ModelPricing) {
        self.prices.insert(model.into(), pricing);
    }

    /// Merge configured prices over the built-in ones
    pub fn extend(&mut self, prices: &HashMap<String, ModelPricing>) {
        for (model, pricing) in prices {
            if pricing.prompt_per_1k < 0.0 || pricing.completion_per_1k < 0.0 {
                warn!(model = %model, "ignoring negative price entry");
                continue;
            }
            self.prices.insert(model.clone(), *pricing);
        }
    }

    pub fn pricing(&self, model: &str) -> Option<&ModelPricing> {
        self.prices.get(model)
    }

    /// Monetary cost of a call; zero for unknown models
    pub fn cost(&self, usage: &UsageRecord, model: &str) -> f64 {
        match self.prices.get(model) {
            Some(pricing) => {
                (usage.prompt_tokens as f64 * pricing.prompt_per_1k
                    + usage.completion_tokens as f64 * pricing.completion_per_1k)
                    / 1000.0
            }
            None => {
                warn!(model, "model not recognized, cost set to 0");
                0.0
            }
        }
    }
}

impl Default for CostTable {
    fn default() -> Self {
        Self::empty()
            .with_pricing("gpt-5-nano", ModelPricing::new(0.00005, 0.0004))
            .with_pricing("gpt-5-mini", ModelPricing::new(0.00025, 0.0020))
    }
}
