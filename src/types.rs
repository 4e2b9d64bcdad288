//! Shared types for the COURTSIDE pipeline.
//!
//! These types form the data model used across all modules. Provider
//! adapters produce `GameSlate`s, the strategy layer turns them into
//! `Candidate`s and a `Recommendation`, and the alerts layer renders that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Market family a quote belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Moneyline,
    Spread,
    Total,
}

impl MarketType {
    /// All market types, in tie-break order.
    pub const ALL: &'static [MarketType] = &[
        MarketType::Moneyline,
        MarketType::Spread,
        MarketType::Total,
    ];

    /// The Odds API market key for this market type.
    pub fn provider_key(&self) -> &'static str {
        match self {
            MarketType::Moneyline => "h2h",
            MarketType::Spread => "spreads",
            MarketType::Total => "totals",
        }
    }

    /// Inverse of [`MarketType::provider_key`].
    pub fn from_provider_key(key: &str) -> Option<Self> {
        match key {
            "h2h" => Some(MarketType::Moneyline),
            "spreads" => Some(MarketType::Spread),
            "totals" => Some(MarketType::Total),
            _ => None,
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketType::Moneyline => write!(f, "Moneyline"),
            MarketType::Spread => write!(f, "Spread"),
            MarketType::Total => write!(f, "Total"),
        }
    }
}

/// The outcome a quote prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
    Over,
    Under,
}

impl Side {
    /// Whether this side names a team (moneyline/spread) rather than a total.
    pub fn is_team(&self) -> bool {
        matches!(self, Side::Home | Side::Away)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => write!(f, "HOME"),
            Side::Away => write!(f, "AWAY"),
            Side::Over => write!(f, "OVER"),
            Side::Under => write!(f, "UNDER"),
        }
    }
}

// ---------------------------------------------------------------------------
// Market snapshot
// ---------------------------------------------------------------------------

/// A single bookmaker price for one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub game_id: String,
    /// Bookmaker key as reported by the provider (e.g. "draftkings").
    pub bookmaker: String,
    pub market_type: MarketType,
    pub side: Side,
    /// Decimal odds. Valid quotes have `price > 1.0`.
    pub price: f64,
    /// Handicap (spread) or line (total). `None` for moneyline.
    pub point: Option<f64>,
}

/// One scheduled game with all of its quotes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSlate {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: DateTime<Utc>,
    pub quotes: Vec<Quote>,
}

impl GameSlate {
    /// Quotes for one market type, in provider order.
    pub fn quotes_for(&self, market_type: MarketType) -> impl Iterator<Item = &Quote> {
        self.quotes.iter().filter(move |q| q.market_type == market_type)
    }

    /// "Away @ Home" label for logs.
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }

    /// The team name behind a team side.
    pub fn team(&self, side: Side) -> Option<&str> {
        match side {
            Side::Home => Some(&self.home_team),
            Side::Away => Some(&self.away_team),
            Side::Over | Side::Under => None,
        }
    }
}

/// Implied probability of a decimal price; `None` for prices ≤ 1.
pub fn implied_probability(price: f64) -> Option<f64> {
    if price.is_finite() && price > 1.0 {
        Some(1.0 / price)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Model output
// ---------------------------------------------------------------------------

/// Adjusted win probability for one game.
///
/// Only the home probability is stored; the away probability is always
/// `1 - home_win_prob`, so the pair sums to one by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelProbability {
    pub home_win_prob: f64,
    /// De-vigged home probability before any adjustment.
    pub fair_home_prob: f64,
}

impl ModelProbability {
    pub fn away_win_prob(&self) -> f64 {
        1.0 - self.home_win_prob
    }

    /// Adjusted win probability for a team side.
    pub fn for_side(&self, side: Side) -> Option<f64> {
        match side {
            Side::Home => Some(self.home_win_prob),
            Side::Away => Some(self.away_win_prob()),
            Side::Over | Side::Under => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Where a candidate's price came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    /// Priced directly by a bookmaker.
    Quoted,
    /// Synthesised by buying points off a quoted line.
    BoughtPoints { from_point: f64 },
}

impl CandidateOrigin {
    fn rank(&self) -> u8 {
        match self {
            CandidateOrigin::Quoted => 0,
            CandidateOrigin::BoughtPoints { .. } => 1,
        }
    }
}

/// Presentation band for a cleared candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Top,
    Mid,
    Base,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Top => write!(f, "🔴🔥"),
            Tier::Mid => write!(f, "🟠"),
            Tier::Base => write!(f, "🟡"),
        }
    }
}

/// A priced bet with its model probability, edge and stake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub game_id: String,
    pub bookmaker: String,
    pub market_type: MarketType,
    pub side: Side,
    pub price: f64,
    pub point: Option<f64>,
    pub origin: CandidateOrigin,
    pub model_prob: f64,
    pub edge: f64,
    pub stake_fraction: f64,
    /// Set by the ranker once the candidate clears its threshold.
    pub tier: Option<Tier>,
    /// Number of agreeing signals (multi-signal mode); 1 otherwise.
    pub signals: u32,
}

impl Candidate {
    /// Deterministic ordering for equal edges.
    pub(crate) fn tie_break_key(&self) -> (MarketType, u8, u64, Side) {
        (
            self.market_type,
            self.origin.rank(),
            self.price.to_bits(),
            self.side,
        )
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.game_id, self.market_type, self.side)?;
        if let Some(point) = self.point {
            write!(f, " {point:+}")?;
        }
        write!(
            f,
            " @ {:.2} (p={:.1}% edge={:+.1}% kelly={:.2}%)",
            self.price,
            self.model_prob * 100.0,
            self.edge * 100.0,
            self.stake_fraction * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

/// Why a game produced no candidates.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum SkipReason {
    #[error("no moneyline quote for {0}")]
    MissingMoneyline(Side),

    #[error("invalid moneyline price {price} for {side}")]
    InvalidPrice { side: Side, price: f64 },

    #[error("no candidate inside the odds band")]
    NoCandidates,
}

/// A game that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSkip {
    pub game_id: String,
    pub matchup: String,
    pub reason: SkipReason,
}

/// Ranked output of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendation {
    /// Candidates that cleared their thresholds, best edge first.
    pub picks: Vec<Candidate>,
    /// Best candidate of each game that produced no pick.
    pub observed: Vec<Candidate>,
    pub skipped: Vec<GameSkip>,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Line history
// ---------------------------------------------------------------------------

/// Last-seen line for one game, carried across runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSnapshot {
    /// De-vigged home probability at the last observation.
    pub implied_probability: f64,
    /// Home spread point at the last observation.
    pub point: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for COURTSIDE.
#[derive(Debug, thiserror::Error)]
pub enum CourtsideError {
    #[error("Odds provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Malformed snapshot from {provider}: {message}")]
    MalformedSnapshot { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Delivery error: {0}")]
    Delivery(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
