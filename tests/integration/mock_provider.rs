//! Deterministic provider and notifier for integration testing.
//!
//! Both are in-memory and cheaply cloneable; clones share state so a
//! test can change the slate between runs or read back what was sent.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex};

use courtside::alerts::Notifier;
use courtside::data::OddsProvider;
use courtside::types::{GameSlate, MarketType, Quote, Side};

/// A mock odds provider serving a fixed, replaceable slate.
#[derive(Clone)]
pub struct MockProvider {
    slate: Arc<Mutex<Vec<GameSlate>>>,
    /// If set, every fetch fails with this message.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockProvider {
    pub fn new(slate: Vec<GameSlate>) -> Self {
        Self {
            slate: Arc::new(Mutex::new(slate)),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_slate(&self, slate: Vec<GameSlate>) {
        *self.slate.lock().unwrap() = slate;
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }
}

#[async_trait]
impl OddsProvider for MockProvider {
    async fn fetch_slate(&self) -> Result<Vec<GameSlate>> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        Ok(self.slate.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Records every chunk it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("webhook returned HTTP 500"));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Slate builders
// ---------------------------------------------------------------------------

pub fn quote(game_id: &str, market_type: MarketType, side: Side, price: f64, point: Option<f64>) -> Quote {
    Quote {
        game_id: game_id.to_string(),
        bookmaker: "mockbook".to_string(),
        market_type,
        side,
        price,
        point,
    }
}

pub fn game(game_id: &str, home: &str, away: &str, quotes: Vec<Quote>) -> GameSlate {
    GameSlate {
        game_id: game_id.to_string(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        start_time: Utc::now() + Duration::hours(6),
        quotes,
    }
}

/// Moneyline 1.80 / 2.10 with a home spread at 2.10.
///
/// The home spread projects to 0.513 against an implied 0.476, clearing
/// the default spread threshold; the home moneyline edge (0.013) does not.
pub fn celtics_heat(home_point: f64) -> GameSlate {
    celtics_heat_as("MOCK-BOS-MIA", home_point)
}

pub fn celtics_heat_as(id: &str, home_point: f64) -> GameSlate {
    game(
        id,
        "Boston Celtics",
        "Miami Heat",
        vec![
            quote(id, MarketType::Moneyline, Side::Home, 1.80, None),
            quote(id, MarketType::Moneyline, Side::Away, 2.10, None),
            quote(id, MarketType::Spread, Side::Home, 2.10, Some(home_point)),
            quote(id, MarketType::Spread, Side::Away, 1.80, Some(-home_point)),
        ],
    )
}

/// A heavy favourite priced outside the odds band on both sides.
pub fn jazz_nuggets() -> GameSlate {
    let id = "MOCK-UTA-DEN";
    game(
        id,
        "Utah Jazz",
        "Denver Nuggets",
        vec![
            quote(id, MarketType::Moneyline, Side::Home, 1.10, None),
            quote(id, MarketType::Moneyline, Side::Away, 7.00, None),
        ],
    )
}

/// Only one side of the moneyline is quoted.
pub fn one_sided() -> GameSlate {
    let id = "MOCK-LAL-GSW";
    game(
        id,
        "Los Angeles Lakers",
        "Golden State Warriors",
        vec![quote(id, MarketType::Moneyline, Side::Home, 1.65, None)],
    )
}

/// A default slate: one pick, one out-of-band game, one broken game.
pub fn default_slate() -> Vec<GameSlate> {
    vec![celtics_heat(-2.5), jazz_nuggets(), one_sided()]
}
