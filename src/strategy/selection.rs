//! Candidate selection and ranking.
//!
//! Reduces each game's candidates to the picks worth surfacing, gates them
//! on per-market edge thresholds, assigns presentation tiers and caps the
//! slate. Two modes:
//!
//! - `single_best`: the highest-edge candidate of each game, if it clears.
//! - `multi_signal`: a team side must collect `required_signals` agreeing
//!   signals (moneyline edge, spread edge, line movement) before its
//!   clearing candidates are emitted; at most one per market type.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use super::edge::MarketThresholds;
use crate::types::{Candidate, LineSnapshot, MarketType, Side, Tier};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    SingleBest,
    MultiSignal,
}

/// Edge floors for the top and mid tiers. Anything cleared below `mid`
/// is base tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierBands {
    pub top: f64,
    pub mid: f64,
}

impl Default for TierBands {
    fn default() -> Self {
        Self { top: 0.05, mid: 0.035 }
    }
}

impl TierBands {
    pub fn classify(&self, edge: f64) -> Tier {
        if edge >= self.top {
            Tier::Top
        } else if edge >= self.mid {
            Tier::Mid
        } else {
            Tier::Base
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiSignalConfig {
    /// Edge a moneyline or spread candidate needs to count as a signal.
    pub sub_threshold: f64,
    pub required_signals: u32,
    /// Fair-probability rise that counts as movement toward a side.
    pub rlm_min_prob_move: f64,
    /// Spread-point move that counts as movement toward a side.
    pub rlm_min_point_move: f64,
}

impl Default for MultiSignalConfig {
    fn default() -> Self {
        Self {
            sub_threshold: 0.015,
            required_signals: 2,
            rlm_min_prob_move: 0.02,
            rlm_min_point_move: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub mode: SelectionMode,
    /// Minimum edge for a candidate to clear, per market type.
    pub edge_threshold: MarketThresholds,
    pub tiers: TierBands,
    /// Keep only the best `top_n` picks of the slate.
    pub top_n: Option<usize>,
    pub multi_signal: MultiSignalConfig,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::SingleBest,
            edge_threshold: MarketThresholds {
                moneyline: 0.02,
                spread: 0.025,
                total: 0.03,
            },
            tiers: TierBands::default(),
            top_n: None,
            multi_signal: MultiSignalConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Line movement
// ---------------------------------------------------------------------------

/// Movement of a game's line since the previous run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineMovement {
    /// No previous observation.
    Unknown,
    Known {
        /// Change in de-vigged home probability.
        home_prob_move: f64,
        /// Change in home spread point (negative = toward the home side).
        home_point_move: Option<f64>,
    },
}

impl LineMovement {
    pub fn between(previous: Option<&LineSnapshot>, current: &LineSnapshot) -> Self {
        let Some(prev) = previous else {
            return LineMovement::Unknown;
        };
        let home_point_move = match (prev.point, current.point) {
            (Some(before), Some(now)) => Some(now - before),
            _ => None,
        };
        LineMovement::Known {
            home_prob_move: current.implied_probability - prev.implied_probability,
            home_point_move,
        }
    }
}

// ---------------------------------------------------------------------------
// Ranker
// ---------------------------------------------------------------------------

/// Everything the ranker needs about one game.
#[derive(Debug, Clone)]
pub struct GameCandidates {
    pub game_id: String,
    pub candidates: Vec<Candidate>,
    pub movement: LineMovement,
}

/// Picks and the below-threshold candidates kept for transparency.
#[derive(Debug, Clone, Default)]
pub struct Ranked {
    pub picks: Vec<Candidate>,
    pub observed: Vec<Candidate>,
}

pub struct SelectionRanker {
    config: SelectionConfig,
}

impl SelectionRanker {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn threshold_for(&self, market_type: MarketType) -> f64 {
        self.config.edge_threshold.for_market(market_type)
    }

    pub fn clears(&self, candidate: &Candidate) -> bool {
        candidate.edge >= self.threshold_for(candidate.market_type)
    }

    /// Rank a whole slate.
    pub fn rank(&self, games: &[GameCandidates]) -> Ranked {
        let mut ranked = Ranked::default();

        for game in games {
            let picks = match self.config.mode {
                SelectionMode::SingleBest => self.single_best(game),
                SelectionMode::MultiSignal => self.multi_signal(game),
            };

            if picks.is_empty() {
                if let Some(best) = best_of(game.candidates.iter()) {
                    ranked.observed.push(best.clone());
                }
            }
            ranked.picks.extend(picks);
        }

        ranked.picks.sort_by(compare_by_edge);
        ranked.observed.sort_by(compare_by_edge);

        if let Some(n) = self.config.top_n {
            if ranked.picks.len() > n {
                debug!(kept = n, dropped = ranked.picks.len() - n, "Slate capped at top_n");
                ranked.picks.truncate(n);
            }
        }

        ranked
    }

    fn single_best(&self, game: &GameCandidates) -> Vec<Candidate> {
        let Some(best) = best_of(game.candidates.iter()) else {
            return Vec::new();
        };
        if !self.clears(best) {
            debug!(
                game_id = %game.game_id,
                edge = format!("{:.4}", best.edge),
                threshold = self.threshold_for(best.market_type),
                "Best candidate below threshold"
            );
            return Vec::new();
        }
        vec![self.finish(best.clone(), 1)]
    }

    fn multi_signal(&self, game: &GameCandidates) -> Vec<Candidate> {
        let ms = &self.config.multi_signal;
        let boosted = self.movement_sides(game.movement);
        let mut qualifying: Vec<Candidate> = Vec::new();

        for side in [Side::Home, Side::Away] {
            let on_side = || game.candidates.iter().filter(move |c| c.side == side);

            let mut signals = 0;
            for market_type in [MarketType::Moneyline, MarketType::Spread] {
                if best_of(on_side().filter(|c| c.market_type == market_type))
                    .is_some_and(|c| c.edge >= ms.sub_threshold)
                {
                    signals += 1;
                }
            }
            if boosted.contains(&side) {
                signals += 1;
            }

            debug!(game_id = %game.game_id, side = %side, signals, "Signals counted");
            if signals < ms.required_signals {
                continue;
            }
            for market_type in [MarketType::Moneyline, MarketType::Spread] {
                if let Some(best) = best_of(on_side().filter(|c| c.market_type == market_type)) {
                    if self.clears(best) {
                        qualifying.push(self.finish(best.clone(), signals));
                    }
                }
            }
        }

        // Totals stand on their own threshold.
        if let Some(best) = best_of(game.candidates.iter().filter(|c| c.market_type == MarketType::Total)) {
            if self.clears(best) {
                qualifying.push(self.finish(best.clone(), 1));
            }
        }

        // One pick per market type: opposite sides can both qualify.
        let mut picks: Vec<Candidate> = Vec::new();
        for market_type in MarketType::ALL {
            if let Some(best) = best_of(qualifying.iter().filter(|c| c.market_type == *market_type)) {
                picks.push(best.clone());
            }
        }
        picks
    }

    /// Team sides the line moved toward by at least the configured amount.
    pub fn movement_sides(&self, movement: LineMovement) -> Vec<Side> {
        let ms = &self.config.multi_signal;
        let LineMovement::Known { home_prob_move, home_point_move } = movement else {
            return Vec::new();
        };

        let mut sides = Vec::new();
        let toward = |side: Side, sides: &mut Vec<Side>| {
            if !sides.contains(&side) {
                sides.push(side);
            }
        };
        if home_prob_move >= ms.rlm_min_prob_move {
            toward(Side::Home, &mut sides);
        } else if -home_prob_move >= ms.rlm_min_prob_move {
            toward(Side::Away, &mut sides);
        }
        if let Some(point_move) = home_point_move {
            if -point_move >= ms.rlm_min_point_move {
                toward(Side::Home, &mut sides);
            } else if point_move >= ms.rlm_min_point_move {
                toward(Side::Away, &mut sides);
            }
        }
        sides
    }

    fn finish(&self, mut candidate: Candidate, signals: u32) -> Candidate {
        candidate.tier = Some(self.config.tiers.classify(candidate.edge));
        candidate.signals = signals;
        candidate
    }
}

/// Highest edge first; equal edges fall back to a fixed key order.
fn compare_by_edge(a: &Candidate, b: &Candidate) -> Ordering {
    b.edge
        .total_cmp(&a.edge)
        .then_with(|| a.game_id.cmp(&b.game_id))
        .then_with(|| a.tie_break_key().cmp(&b.tie_break_key()))
}

fn best_of<'a>(candidates: impl Iterator<Item = &'a Candidate>) -> Option<&'a Candidate> {
    candidates.min_by(|a, b| compare_by_edge(a, b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
