//! Plain-text rendering of a slate evaluation.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt::Write as _;

use super::teams::TeamNames;
use crate::config::DisplayConfig;
use crate::strategy::kelly::StakingEngine;
use crate::strategy::SlateEvaluation;
use crate::types::{Candidate, CandidateOrigin, GameSlate, MarketType, Tier};

pub const NO_GAMES: &str = "No games today or no data from the odds provider.";
pub const NO_PICKS: &str = "No strong recommendation today (no qualifying candidates).";
const SEPARATOR: &str = "--------------------";

pub struct MessageRenderer {
    display: DisplayConfig,
    names: TeamNames,
}

impl MessageRenderer {
    pub fn new(display: DisplayConfig) -> Self {
        let names = TeamNames::new(display.locale, &display.team_names);
        Self { display, names }
    }

    pub fn render(
        &self,
        slate: &[GameSlate],
        evaluation: &SlateEvaluation,
        staking: &StakingEngine,
        date: NaiveDate,
    ) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "**🏀 {} | {}**", self.display.title, date.format("%Y-%m-%d"));
        out.push('\n');

        if slate.is_empty() {
            out.push_str(NO_GAMES);
            out.push('\n');
            return out;
        }

        let games: HashMap<&str, &GameSlate> =
            slate.iter().map(|g| (g.game_id.as_str(), g)).collect();
        let rec = &evaluation.recommendation;

        out.push_str("__Recommended__\n");
        if rec.picks.is_empty() {
            out.push_str(NO_PICKS);
            out.push('\n');
        }
        for pick in &rec.picks {
            self.write_candidate(&mut out, games.get(pick.game_id.as_str()).copied(), pick, staking);
        }

        if self.display.show_observed && !rec.observed.is_empty() {
            out.push('\n');
            out.push_str("__Below threshold__\n");
            for c in &rec.observed {
                self.write_candidate(&mut out, games.get(c.game_id.as_str()).copied(), c, staking);
            }
        }

        if self.display.show_all_games {
            out.push('\n');
            out.push_str(SEPARATOR);
            out.push('\n');
            out.push_str("__All games__\n");
            let probs: HashMap<&str, _> = evaluation
                .probabilities
                .iter()
                .map(|(id, p)| (id.as_str(), p))
                .collect();
            let points: HashMap<&str, Option<f64>> = evaluation
                .observed_lines
                .iter()
                .map(|(id, line)| (id.as_str(), line.point))
                .collect();
            for game in slate {
                let Some(p) = probs.get(game.game_id.as_str()) else {
                    continue;
                };
                let spread = match points.get(game.game_id.as_str()).copied().flatten() {
                    Some(point) => format!("{} {point:+}", self.names.display(&game.home_team)),
                    None => "n/a".to_string(),
                };
                let _ = writeln!(
                    out,
                    "{} | home {:.1}% (fair {:.1}%) | spread {}",
                    self.matchup(game),
                    p.home_win_prob * 100.0,
                    p.fair_home_prob * 100.0,
                    spread
                );
            }
            for skip in &rec.skipped {
                let label = games
                    .get(skip.game_id.as_str())
                    .map(|g| self.matchup(g))
                    .unwrap_or_else(|| skip.matchup.clone());
                let _ = writeln!(out, "⚠️ {label}: {}", skip.reason);
            }
        }

        out
    }

    fn matchup(&self, game: &GameSlate) -> String {
        format!(
            "{} @ {}",
            self.names.display(&game.away_team),
            self.names.display(&game.home_team)
        )
    }

    fn write_candidate(
        &self,
        out: &mut String,
        game: Option<&GameSlate>,
        c: &Candidate,
        staking: &StakingEngine,
    ) {
        let marker = c.tier.unwrap_or(Tier::Base);
        let heading = game.map(|g| self.matchup(g)).unwrap_or_else(|| c.game_id.clone());
        let _ = writeln!(out, "{marker} {heading}");
        let _ = writeln!(
            out,
            "   {} {} @ {:.2} [{}]",
            c.market_type,
            self.selection(game, c),
            c.price,
            c.bookmaker
        );

        let mut stats = format!(
            "   Model {:.1}% | Edge {:+.1}% | Kelly {:.2}%",
            c.model_prob * 100.0,
            c.edge * 100.0,
            c.stake_fraction * 100.0
        );
        if let Some(amount) = staking.stake_amount(c.stake_fraction) {
            let _ = write!(stats, " (${amount})");
        }
        if c.signals > 1 {
            let _ = write!(stats, " | signals {}", c.signals);
        }
        out.push_str(&stats);
        out.push('\n');
    }

    fn selection(&self, game: Option<&GameSlate>, c: &Candidate) -> String {
        let mut label = match (c.market_type, game.and_then(|g| g.team(c.side))) {
            (MarketType::Total, _) | (_, None) => c.side.to_string(),
            (_, Some(team)) => self.names.display(team).to_string(),
        };
        if let Some(point) = c.point {
            match c.market_type {
                MarketType::Total => {
                    let _ = write!(label, " {point}");
                }
                _ => {
                    let _ = write!(label, " {point:+}");
                }
            }
        }
        if let CandidateOrigin::BoughtPoints { from_point } = c.origin {
            let _ = write!(label, " (bought from {from_point:+})");
        }
        label
    }
}
