//! Market projection.
//!
//! Maps the adjusted moneyline probability onto every quoted line of a
//! game: moneyline sides pass through, spread sides are compressed toward
//! 50/50 and penalised on deep lines, totals lean on the size of the
//! mismatch. Optionally synthesises bought-points alternates.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::probability::ClipBand;
use crate::types::{CandidateOrigin, GameSlate, MarketType, ModelProbability, Quote, Side};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Penalty bucket for large spreads.
///
/// A bucket covers `|point| > above` (exclusive lower edge). When several
/// buckets match, the one with the largest `above` wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeepLineBucket {
    pub above: f64,
    /// Replaces `spread_coefficient` inside this bucket when set.
    #[serde(default)]
    pub coefficient: Option<f64>,
    pub penalty: f64,
}

/// Buying points on mid-sized spreads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointBuy {
    /// Inclusive `|point|` band where buying is considered.
    pub bridge_min: f64,
    pub bridge_max: f64,
    /// Points moved in the bettor's favour.
    pub increment: f64,
    /// Multiplier applied to the quoted decimal price.
    pub price_factor: f64,
    /// Probability added on top of the projection at the new point.
    pub probability_bonus: f64,
}

impl Default for PointBuy {
    fn default() -> Self {
        Self {
            bridge_min: 7.0,
            bridge_max: 11.0,
            increment: 1.5,
            price_factor: 0.91,
            probability_bonus: 0.03,
        }
    }
}

/// Which total the moneyline mismatch leans toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalsLean {
    #[default]
    Over,
    Under,
}

impl TotalsLean {
    fn side(&self) -> Side {
        match self {
            TotalsLean::Over => Side::Over,
            TotalsLean::Under => Side::Under,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub spread_coefficient: f64,
    pub deep_line_penalty_buckets: Vec<DeepLineBucket>,
    /// `None` disables the point-buy transform.
    pub point_buy: Option<PointBuy>,
    pub total_coefficient: f64,
    pub mismatch_favors: TotalsLean,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            spread_coefficient: 0.19,
            deep_line_penalty_buckets: vec![
                DeepLineBucket { above: 8.5, coefficient: None, penalty: 0.005 },
                DeepLineBucket { above: 10.5, coefficient: Some(0.17), penalty: 0.015 },
                DeepLineBucket { above: 15.0, coefficient: Some(0.15), penalty: 0.03 },
            ],
            point_buy: None,
            total_coefficient: 0.08,
            mismatch_favors: TotalsLean::Over,
        }
    }
}

// ---------------------------------------------------------------------------
// Projector
// ---------------------------------------------------------------------------

/// A line with its model probability, before edge and stake.
#[derive(Debug, Clone, PartialEq)]
pub struct Projected {
    pub quote: Quote,
    pub origin: CandidateOrigin,
    pub model_prob: f64,
}

pub struct MarketProjector {
    config: ProjectionConfig,
    clip: ClipBand,
}

impl MarketProjector {
    pub fn new(config: ProjectionConfig, clip: ClipBand) -> Self {
        Self { config, clip }
    }

    /// Project every quote of a game. Markets without quotes yield nothing.
    pub fn project(&self, game: &GameSlate, model: &ModelProbability) -> Vec<Projected> {
        let mut out = Vec::with_capacity(game.quotes.len());

        for quote in &game.quotes {
            let projected = match quote.market_type {
                MarketType::Moneyline => model.for_side(quote.side),
                MarketType::Spread => match (model.for_side(quote.side), quote.point) {
                    (Some(p), Some(point)) => Some(self.project_spread(p, point)),
                    _ => None,
                },
                MarketType::Total => quote.point.and_then(|_| self.project_total(model, quote.side)),
            };

            let Some(model_prob) = projected else {
                debug!(
                    game_id = %game.game_id,
                    market = %quote.market_type,
                    side = %quote.side,
                    "Quote has no projectable line"
                );
                continue;
            };

            out.push(Projected {
                quote: quote.clone(),
                origin: CandidateOrigin::Quoted,
                model_prob,
            });

            if quote.market_type == MarketType::Spread {
                if let Some(bought) = model
                    .for_side(quote.side)
                    .and_then(|p| self.buy_points(quote, p))
                {
                    out.push(bought);
                }
            }
        }

        out
    }

    /// Spread cover probability for a side with moneyline probability `p`.
    pub fn project_spread(&self, ml_prob: f64, point: f64) -> f64 {
        let (coefficient, penalty) = match self.bucket_for(point) {
            Some(bucket) => (
                bucket.coefficient.unwrap_or(self.config.spread_coefficient),
                bucket.penalty,
            ),
            None => (self.config.spread_coefficient, 0.0),
        };
        self.clip.clamp(0.5 + (ml_prob - 0.5) * coefficient - penalty)
    }

    /// Probability for an over/under side, from the moneyline mismatch.
    pub fn project_total(&self, model: &ModelProbability, side: Side) -> Option<f64> {
        if side.is_team() {
            return None;
        }
        let mismatch = (model.home_win_prob - 0.5).abs();
        let favoured = self.clip.clamp(0.5 + mismatch * self.config.total_coefficient);
        if side == self.config.mismatch_favors.side() {
            Some(favoured)
        } else {
            Some(1.0 - favoured)
        }
    }

    /// The deep-line bucket a point falls in, if any.
    pub fn bucket_for(&self, point: f64) -> Option<&DeepLineBucket> {
        let abs = point.abs();
        self.config
            .deep_line_penalty_buckets
            .iter()
            .filter(|b| abs > b.above)
            .max_by(|a, b| a.above.total_cmp(&b.above))
    }

    /// Synthesise a bought-points alternate for a spread quote.
    fn buy_points(&self, quote: &Quote, ml_prob: f64) -> Option<Projected> {
        let buy = self.config.point_buy?;
        let point = quote.point?;
        let abs = point.abs();
        if abs < buy.bridge_min || abs > buy.bridge_max {
            return None;
        }

        let price = quote.price * buy.price_factor;
        if price <= 1.0 {
            return None;
        }
        let new_point = point + buy.increment;
        let model_prob = self
            .clip
            .clamp(self.project_spread(ml_prob, new_point) + buy.probability_bonus);

        debug!(
            game_id = %quote.game_id,
            side = %quote.side,
            from_point = point,
            to_point = new_point,
            price = format!("{:.3}", price),
            "Bought points alternate"
        );

        Some(Projected {
            quote: Quote {
                price,
                point: Some(new_point),
                ..quote.clone()
            },
            origin: CandidateOrigin::BoughtPoints { from_point: point },
            model_prob,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
