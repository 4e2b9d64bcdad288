//! Strategy engine: probability model, market projection, edge scoring,
//! Kelly staking and selection.

pub mod edge;
pub mod kelly;
pub mod probability;
pub mod projector;
pub mod selection;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::LineStore;
use crate::types::{
    Candidate, GameSkip, GameSlate, LineSnapshot, ModelProbability, Recommendation, SkipReason,
};
use edge::{EdgeConfig, EdgeEvaluator};
use kelly::{KellyConfig, StakingEngine};
use probability::{ProbabilityConfig, ProbabilityModel};
use projector::{MarketProjector, ProjectionConfig};
use selection::{GameCandidates, LineMovement, SelectionConfig, SelectionRanker};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Every tunable of the pipeline. Built once, never mutated during a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub probability: ProbabilityConfig,
    pub projection: ProjectionConfig,
    pub edge: EdgeConfig,
    pub staking: KellyConfig,
    pub selection: SelectionConfig,
}

// ---------------------------------------------------------------------------
// Evaluation output
// ---------------------------------------------------------------------------

/// Result of evaluating one slate.
#[derive(Debug, Clone)]
pub struct SlateEvaluation {
    pub recommendation: Recommendation,
    /// Lines to write back to the history store.
    pub observed_lines: Vec<(String, LineSnapshot)>,
    /// Adjusted probability of every game that was modelled.
    pub probabilities: Vec<(String, ModelProbability)>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Pipelines de-vig → projection → edge → stake → selection.
///
/// Evaluation is a pure function of the slate, the previous lines and the
/// observation time; nothing is written here.
pub struct StrategyOrchestrator {
    model: ProbabilityModel,
    projector: MarketProjector,
    evaluator: EdgeEvaluator,
    staking: StakingEngine,
    ranker: SelectionRanker,
}

impl StrategyOrchestrator {
    pub fn new(config: ModelConfig) -> Self {
        let clip = config.probability.clip_band();
        Self {
            model: ProbabilityModel::new(config.probability),
            projector: MarketProjector::new(config.projection, clip),
            evaluator: EdgeEvaluator::new(config.edge),
            staking: StakingEngine::new(config.staking),
            ranker: SelectionRanker::new(config.selection),
        }
    }

    pub fn staking(&self) -> &StakingEngine {
        &self.staking
    }

    /// Evaluate a slate against the previous lines in `history`.
    pub fn evaluate(
        &self,
        slate: &[GameSlate],
        history: &dyn LineStore,
        now: DateTime<Utc>,
    ) -> SlateEvaluation {
        let mut skipped: Vec<GameSkip> = Vec::new();
        let mut games: Vec<GameCandidates> = Vec::new();
        let mut observed_lines = Vec::new();
        let mut probabilities = Vec::new();

        for game in slate {
            let model = match self.model.estimate(game) {
                Ok(m) => m,
                Err(reason) => {
                    debug!(game_id = %game.game_id, reason = %reason, "Game skipped");
                    skipped.push(skip(game, reason));
                    continue;
                }
            };
            probabilities.push((game.game_id.clone(), model));

            let current = LineSnapshot {
                implied_probability: model.fair_home_prob,
                point: self.model.home_spread_point(game),
                observed_at: now,
            };
            let movement = LineMovement::between(history.get(&game.game_id).as_ref(), &current);
            observed_lines.push((game.game_id.clone(), current));

            let candidates = self.candidates_for(game, &model);
            if candidates.is_empty() {
                skipped.push(skip(game, SkipReason::NoCandidates));
                continue;
            }
            games.push(GameCandidates {
                game_id: game.game_id.clone(),
                candidates,
                movement,
            });
        }

        let ranked = self.ranker.rank(&games);

        info!(
            games = slate.len(),
            modelled = probabilities.len(),
            skipped = skipped.len(),
            picks = ranked.picks.len(),
            observed = ranked.observed.len(),
            "Slate evaluated"
        );

        SlateEvaluation {
            recommendation: Recommendation {
                picks: ranked.picks,
                observed: ranked.observed,
                skipped,
            },
            observed_lines,
            probabilities,
        }
    }

    /// Every scored, staked candidate of one game.
    pub fn candidates_for(&self, game: &GameSlate, model: &ModelProbability) -> Vec<Candidate> {
        self.projector
            .project(game, model)
            .into_iter()
            .filter_map(|projected| {
                let edge = self.evaluator.evaluate(&projected)?;
                let stake_fraction = self.staking.stake(projected.model_prob, projected.quote.price);
                let quote = projected.quote;
                Some(Candidate {
                    game_id: quote.game_id,
                    bookmaker: quote.bookmaker,
                    market_type: quote.market_type,
                    side: quote.side,
                    price: quote.price,
                    point: quote.point,
                    origin: projected.origin,
                    model_prob: projected.model_prob,
                    edge,
                    stake_fraction,
                    tier: None,
                    signals: 1,
                })
            })
            .collect()
    }
}

fn skip(game: &GameSlate, reason: SkipReason) -> GameSkip {
    GameSkip {
        game_id: game.game_id.clone(),
        matchup: game.matchup(),
        reason,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
