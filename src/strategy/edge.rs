//! Edge scoring.
//!
//! Compares a projected model probability to the offered price and drops
//! prices outside the configured odds band.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::projector::Projected;
use crate::types::{implied_probability, MarketType};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A value per market type (thresholds, penalties).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketThresholds {
    pub moneyline: f64,
    pub spread: f64,
    pub total: f64,
}

impl MarketThresholds {
    pub const fn uniform(value: f64) -> Self {
        Self {
            moneyline: value,
            spread: value,
            total: value,
        }
    }

    pub fn for_market(&self, market_type: MarketType) -> f64 {
        match market_type {
            MarketType::Moneyline => self.moneyline,
            MarketType::Spread => self.spread,
            MarketType::Total => self.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Inclusive decimal-odds band a price must fall in.
    pub odds_min: f64,
    pub odds_max: f64,
    /// Flat probability penalty subtracted from every edge, per market.
    pub edge_penalty: MarketThresholds,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            odds_min: 1.40,
            odds_max: 3.50,
            edge_penalty: MarketThresholds::uniform(0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// `p - 1/o`, or `None` when the price has no implied probability.
pub fn raw_edge(p: f64, price: f64) -> Option<f64> {
    implied_probability(price).map(|implied| p - implied)
}

pub struct EdgeEvaluator {
    config: EdgeConfig,
}

impl EdgeEvaluator {
    pub fn new(config: EdgeConfig) -> Self {
        Self { config }
    }

    pub fn in_odds_band(&self, price: f64) -> bool {
        price >= self.config.odds_min && price <= self.config.odds_max
    }

    /// Edge for a projected line, or `None` if the price is filtered out.
    /// Negative edges are returned as-is.
    pub fn evaluate(&self, projected: &Projected) -> Option<f64> {
        let quote = &projected.quote;
        if !self.in_odds_band(quote.price) {
            debug!(
                game_id = %quote.game_id,
                market = %quote.market_type,
                side = %quote.side,
                price = quote.price,
                "Price outside odds band"
            );
            return None;
        }
        let penalty = self.config.edge_penalty.for_market(quote.market_type);
        raw_edge(projected.model_prob, quote.price).map(|e| e - penalty)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
