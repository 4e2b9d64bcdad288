//! Moneyline de-vig and probability adjustment.
//!
//! Recovers a fair home win probability from one bookmaker's moneyline
//! pair, then runs it through the configured adjustment chain:
//! home advantage → regression/fade → clipping.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{implied_probability, GameSlate, MarketType, ModelProbability, Side, SkipReason};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// How the bookmaker margin is removed from a set of prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevigMethod {
    /// Divide each implied probability by the overround.
    #[default]
    Proportional,
    /// Subtract an equal share of the margin from each side.
    Additive,
}

impl DevigMethod {
    /// Fair probabilities for a complete set of outcome prices.
    ///
    /// Returns `None` for fewer than two prices or any price ≤ 1.
    pub fn devig(&self, prices: &[f64]) -> Option<Vec<f64>> {
        if prices.len() < 2 {
            return None;
        }
        let implied = prices
            .iter()
            .map(|p| implied_probability(*p))
            .collect::<Option<Vec<f64>>>()?;
        let total: f64 = implied.iter().sum();

        match self {
            DevigMethod::Proportional => Some(proportional(&implied, total)),
            DevigMethod::Additive => {
                let margin = (total - 1.0) / implied.len() as f64;
                let shifted: Vec<f64> = implied.iter().map(|p| p - margin).collect();
                // Longshots can go negative under a big margin.
                if shifted.iter().any(|p| *p <= 0.0 || *p >= 1.0) {
                    return Some(proportional(&implied, total));
                }
                let sum: f64 = shifted.iter().sum();
                Some(shifted.iter().map(|p| p / sum).collect())
            }
        }
    }
}

fn proportional(implied: &[f64], total: f64) -> Vec<f64> {
    implied.iter().map(|p| p / total).collect()
}

/// Home-court adjustment applied to the de-vigged home probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum HomeAdvantage {
    None,
    /// Add `home_boost`, never exceeding `home_cap`.
    Fixed { home_boost: f64, home_cap: f64 },
}

impl Default for HomeAdvantage {
    fn default() -> Self {
        HomeAdvantage::Fixed {
            home_boost: 0.03,
            home_cap: 0.96,
        }
    }
}

impl HomeAdvantage {
    pub fn apply(&self, home_prob: f64) -> f64 {
        match self {
            HomeAdvantage::None => home_prob,
            HomeAdvantage::Fixed { home_boost, home_cap } => {
                // A cap below the input never lowers it.
                (home_prob + home_boost).min(home_cap.max(home_prob))
            }
        }
    }
}

/// One step of a tiered fade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeTier {
    pub threshold: f64,
    pub decrement: f64,
}

/// Pull toward 0.5 for probabilities outside the confidence band.
///
/// The band is symmetric: a threshold `t` fades `p > t` down and
/// `p < 1 - t` up. A fade never crosses 0.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Regression {
    None,
    FixedDecrement {
        regression_threshold: f64,
        regression_decrement: f64,
    },
    /// Shrink the distance from 0.5 by `factor` beyond the threshold.
    Multiplicative { regression_threshold: f64, factor: f64 },
    /// The tier with the highest threshold strictly below `p` applies.
    Tiered { tiers: Vec<FadeTier> },
}

impl Default for Regression {
    fn default() -> Self {
        Regression::FixedDecrement {
            regression_threshold: 0.70,
            regression_decrement: 0.03,
        }
    }
}

impl Regression {
    pub fn apply(&self, p: f64) -> f64 {
        // Work on the favourite's probability and mirror back.
        let (fav, mirrored) = if p >= 0.5 { (p, false) } else { (1.0 - p, true) };

        let faded = match self {
            Regression::None => fav,
            Regression::FixedDecrement {
                regression_threshold,
                regression_decrement,
            } => {
                if fav > *regression_threshold {
                    (fav - regression_decrement).max(0.5)
                } else {
                    fav
                }
            }
            Regression::Multiplicative {
                regression_threshold,
                factor,
            } => {
                if fav > *regression_threshold {
                    0.5 + (fav - 0.5) * factor.clamp(0.0, 1.0)
                } else {
                    fav
                }
            }
            Regression::Tiered { tiers } => tiers
                .iter()
                .filter(|t| fav > t.threshold)
                .max_by(|a, b| a.threshold.total_cmp(&b.threshold))
                .map(|t| (fav - t.decrement).max(0.5))
                .unwrap_or(fav),
        };

        if faded == fav {
            p
        } else if mirrored {
            1.0 - faded
        } else {
            faded
        }
    }
}

/// Safety band every model probability is clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipBand {
    pub min: f64,
    pub max: f64,
}

impl ClipBand {
    pub fn clamp(&self, p: f64) -> f64 {
        p.clamp(self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbabilityConfig {
    pub devig: DevigMethod,
    pub home_advantage: HomeAdvantage,
    pub regression: Regression,
    pub clip_min: f64,
    pub clip_max: f64,
    /// Bookmakers tried first for the moneyline pair, in order.
    pub preferred_bookmakers: Vec<String>,
}

impl Default for ProbabilityConfig {
    fn default() -> Self {
        Self {
            devig: DevigMethod::Proportional,
            home_advantage: HomeAdvantage::default(),
            regression: Regression::default(),
            clip_min: 0.05,
            clip_max: 0.95,
            preferred_bookmakers: Vec::new(),
        }
    }
}

impl ProbabilityConfig {
    pub fn clip_band(&self) -> ClipBand {
        ClipBand {
            min: self.clip_min,
            max: self.clip_max,
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

pub struct ProbabilityModel {
    config: ProbabilityConfig,
}

impl ProbabilityModel {
    pub fn new(config: ProbabilityConfig) -> Self {
        Self { config }
    }

    /// Estimate the adjusted home win probability for one game.
    pub fn estimate(&self, game: &GameSlate) -> Result<ModelProbability, SkipReason> {
        let (home_price, away_price) = self.moneyline_pair(game)?;

        let fair = self
            .config
            .devig
            .devig(&[home_price, away_price])
            .ok_or(SkipReason::InvalidPrice {
                side: Side::Home,
                price: home_price,
            })?;
        let fair_home = fair[0];
        let home_win_prob = self.adjust(fair_home);

        debug!(
            game_id = %game.game_id,
            home_price,
            away_price,
            fair_home = format!("{:.4}", fair_home),
            adjusted_home = format!("{:.4}", home_win_prob),
            "Moneyline de-vigged"
        );

        Ok(ModelProbability {
            home_win_prob,
            fair_home_prob: fair_home,
        })
    }

    /// Run a de-vigged home probability through the adjustment chain.
    pub fn adjust(&self, fair_home: f64) -> f64 {
        let boosted = self.config.home_advantage.apply(fair_home);
        let faded = self.config.regression.apply(boosted);
        self.config.clip_band().clamp(faded)
    }

    /// Bookmakers quoting `market` for this game, best first.
    ///
    /// Preferred bookmakers come first in config order, the rest follow by
    /// key. Provider order never matters.
    pub fn ranked_bookmakers<'a>(&self, game: &'a GameSlate, market: MarketType) -> Vec<&'a str> {
        let mut rest: Vec<&'a str> = game
            .quotes_for(market)
            .map(|q| q.bookmaker.as_str())
            .collect();
        rest.sort_unstable();
        rest.dedup();

        let mut books = Vec::with_capacity(rest.len());
        for preferred in &self.config.preferred_bookmakers {
            if let Some(i) = rest.iter().position(|b| *b == preferred.as_str()) {
                books.push(rest.remove(i));
            }
        }
        books.extend(rest);
        books
    }

    /// Home spread point from the highest-ranked bookmaker quoting one.
    pub fn home_spread_point(&self, game: &GameSlate) -> Option<f64> {
        self.ranked_bookmakers(game, MarketType::Spread)
            .into_iter()
            .find_map(|book| {
                game.quotes_for(MarketType::Spread)
                    .find(|q| q.bookmaker == book && q.side == Side::Home)
                    .and_then(|q| q.point)
            })
    }

    /// Pick the highest-ranked bookmaker that prices both sides validly.
    fn moneyline_pair(&self, game: &GameSlate) -> Result<(f64, f64), SkipReason> {
        let quotes: Vec<_> = game.quotes_for(MarketType::Moneyline).collect();
        let books = self.ranked_bookmakers(game, MarketType::Moneyline);

        let mut first_invalid: Option<SkipReason> = None;
        for book in books {
            let price = |side: Side| {
                quotes
                    .iter()
                    .find(|q| q.bookmaker == book && q.side == side)
                    .map(|q| q.price)
            };
            let (Some(home), Some(away)) = (price(Side::Home), price(Side::Away)) else {
                continue;
            };
            match (implied_probability(home), implied_probability(away)) {
                (Some(_), Some(_)) => return Ok((home, away)),
                (None, _) => {
                    first_invalid.get_or_insert(SkipReason::InvalidPrice { side: Side::Home, price: home });
                }
                (_, None) => {
                    first_invalid.get_or_insert(SkipReason::InvalidPrice { side: Side::Away, price: away });
                }
            }
        }

        if let Some(reason) = first_invalid {
            return Err(reason);
        }
        if !quotes.iter().any(|q| q.side == Side::Home) {
            return Err(SkipReason::MissingMoneyline(Side::Home));
        }
        Err(SkipReason::MissingMoneyline(Side::Away))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
