//! Kelly criterion stake sizing.
//!
//! Full Kelly on decimal odds, scaled by a fractional multiplier and
//! clipped to an absolute cap per bet.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::implied_probability;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KellyConfig {
    /// Fractional Kelly multiplier (0.25 = quarter-Kelly).
    pub kelly_fraction: f64,
    /// Maximum stake as a fraction of bankroll.
    pub kelly_cap: f64,
    /// Bankroll used to express stakes as amounts. Fractions only if unset.
    pub bankroll: Option<Decimal>,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: 0.25,
            kelly_cap: 0.05,
            bankroll: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Staking engine
// ---------------------------------------------------------------------------

pub struct StakingEngine {
    config: KellyConfig,
}

impl StakingEngine {
    pub fn new(config: KellyConfig) -> Self {
        Self { config }
    }

    /// Raw Kelly fraction: f* = (bp - q) / b with b = o - 1.
    ///
    /// Written as `(p - 1/o) · o / b` so the sign of the stake is the sign
    /// of the edge. Zero when `p ≤ 1/o` or the price is ≤ 1.
    pub fn full_kelly(p: f64, price: f64) -> f64 {
        let Some(implied) = implied_probability(price) else {
            return 0.0;
        };
        let excess = p - implied;
        if excess <= 0.0 {
            return 0.0;
        }
        excess * price / (price - 1.0)
    }

    /// Capped fractional-Kelly stake, always in `[0, kelly_cap]`.
    pub fn stake(&self, p: f64, price: f64) -> f64 {
        let kelly = Self::full_kelly(p, price);
        if kelly <= 0.0 {
            return 0.0;
        }
        let fractional = kelly * self.config.kelly_fraction;
        let capped = fractional.min(self.config.kelly_cap).max(0.0);

        debug!(
            raw_kelly = format!("{:.2}%", kelly * 100.0),
            stake = format!("{:.2}%", capped * 100.0),
            "Stake sized"
        );

        capped
    }

    /// Stake fraction as an amount of the configured bankroll, in cents.
    pub fn stake_amount(&self, stake_fraction: f64) -> Option<Decimal> {
        let bankroll = self.config.bankroll?;
        let fraction = Decimal::from_f64(stake_fraction)?;
        Some((bankroll * fraction).round_dp(2))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_no_edge_no_stake() {
        let engine = StakingEngine::new(KellyConfig::default());
        for price in [1.2, 1.5, 1.91, 2.5, 4.0, 10.0] {
            let implied = 1.0 / price;
            assert_eq!(engine.stake(implied, price), 0.0);
            assert_eq!(engine.stake(implied - 0.05, price), 0.0);
        }
    }

    #[test]
    fn test_positive_edge_stake_within_cap() {
        let engine = StakingEngine::new(KellyConfig::default());
        for (p, price) in [(0.56, 1.91), (0.60, 1.80), (0.30, 4.0), (0.99, 1.5)] {
            let stake = engine.stake(p, price);
            assert!(stake > 0.0, "p={p} price={price}");
            assert!(stake <= 0.05, "p={p} price={price} stake={stake}");
        }
    }

    #[test]
    fn test_smallest_edge_still_stakes() {
        let engine = StakingEngine::new(KellyConfig::default());
        for cents in 101..1000 {
            let price = cents as f64 / 100.0;
            let implied = 1.0 / price;
            let p = f64::from_bits(implied.to_bits() + 1);
            assert!(p > implied);
            assert!(engine.stake(p, price) > 0.0, "price={price}");
        }
    }

    #[test]
    fn test_full_kelly_formula() {
        // b = 1, p = 0.6 → (0.6 - 0.4) / 1
        assert!((StakingEngine::full_kelly(0.6, 2.0) - 0.2).abs() < 1e-12);
        assert_eq!(StakingEngine::full_kelly(0.9, 1.0), 0.0);
        assert_eq!(StakingEngine::full_kelly(0.9, 0.5), 0.0);
    }

    #[test]
    fn test_fraction_applied_before_cap() {
        let engine = StakingEngine::new(KellyConfig {
            kelly_fraction: 0.1,
            kelly_cap: 0.08,
            bankroll: None,
        });
        assert!((engine.stake(0.6, 2.0) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_cap_binds_on_large_edge() {
        let engine = StakingEngine::new(KellyConfig {
            kelly_fraction: 1.0,
            kelly_cap: 0.045,
            bankroll: None,
        });
        assert_eq!(engine.stake(0.8, 2.0), 0.045);
    }

    #[test]
    fn test_stake_amount_needs_bankroll() {
        let none = StakingEngine::new(KellyConfig::default());
        assert!(none.stake_amount(0.02).is_none());

        let some = StakingEngine::new(KellyConfig {
            bankroll: Some(dec!(1000)),
            ..Default::default()
        });
        assert_eq!(some.stake_amount(0.0234), Some(dec!(23.40)));
    }
}
