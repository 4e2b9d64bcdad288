//! The Odds API provider.
//!
//! API: `https://api.the-odds-api.com/v4/sports/{sport}/odds`
//! Auth: `apiKey` query parameter. Quota is reported back in the
//! `x-requests-remaining` / `x-requests-used` response headers.
//!
//! Each game lists bookmakers, each bookmaker lists markets
//! (`h2h`, `spreads`, `totals`) and each market lists outcomes
//! `{name, price, point?}` in decimal odds.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::OddsProvider;
use crate::config::OddsApiConfig;
use crate::types::{CourtsideError, GameSlate, MarketType, Quote, Side};

const PROVIDER_NAME: &str = "the-odds-api";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ApiGame {
    pub id: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<ApiBookmaker>,
}

#[derive(Debug, Deserialize)]
pub struct ApiBookmaker {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markets: Vec<ApiMarket>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<ApiOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOutcome {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub point: Option<f64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OddsApiClient {
    http: Client,
    config: OddsApiConfig,
    api_key: SecretString,
}

impl OddsApiClient {
    pub fn new(config: OddsApiConfig, api_key: SecretString) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("COURTSIDE/0.1.0")
            .build()
            .context("Failed to build odds HTTP client")?;
        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    fn odds_url(&self) -> String {
        format!(
            "{}/sports/{}/odds",
            self.config.base_url.trim_end_matches('/'),
            self.config.sport
        )
    }

    fn markets_param(&self) -> String {
        self.config
            .markets
            .iter()
            .map(|m| m.provider_key())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Convert provider games into slates, keeping requested markets and
    /// (if configured) requested bookmakers only.
    pub fn to_slates(&self, games: Vec<ApiGame>) -> Vec<GameSlate> {
        games
            .into_iter()
            .map(|g| convert_game(g, &self.config.markets, &self.config.bookmakers))
            .collect()
    }
}

#[async_trait]
impl OddsProvider for OddsApiClient {
    async fn fetch_slate(&self) -> Result<Vec<GameSlate>> {
        let url = self.odds_url();
        let markets = self.markets_param();

        let mut query: Vec<(&str, &str)> = vec![
            ("apiKey", self.api_key.expose_secret().as_str()),
            ("regions", self.config.regions.as_str()),
            ("markets", markets.as_str()),
            ("oddsFormat", "decimal"),
        ];
        let bookmakers = self.config.bookmakers.join(",");
        if !bookmakers.is_empty() {
            query.push(("bookmakers", bookmakers.as_str()));
        }

        debug!(url = %url, markets = %markets, "Fetching odds");
        let resp = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| CourtsideError::Provider {
                provider: PROVIDER_NAME.into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let remaining = header_str(&resp, "x-requests-remaining");
        let used = header_str(&resp, "x-requests-used");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CourtsideError::Provider {
                provider: PROVIDER_NAME.into(),
                message: format!("HTTP {status}: {body}"),
            }
            .into());
        }

        let games: Vec<ApiGame> = resp.json().await.map_err(|e| CourtsideError::MalformedSnapshot {
            provider: PROVIDER_NAME.into(),
            message: e.to_string(),
        })?;

        info!(
            sport = %self.config.sport,
            games = games.len(),
            requests_remaining = ?remaining,
            requests_used = ?used,
            "Odds fetched"
        );

        Ok(self.to_slates(games))
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

fn header_str(resp: &reqwest::Response, name: &str) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

fn convert_game(game: ApiGame, markets: &[MarketType], bookmakers: &[String]) -> GameSlate {
    let mut quotes = Vec::new();

    for book in &game.bookmakers {
        if !bookmakers.is_empty() && !bookmakers.contains(&book.key) {
            continue;
        }
        for market in &book.markets {
            let Some(market_type) = MarketType::from_provider_key(&market.key) else {
                continue;
            };
            if !markets.contains(&market_type) {
                continue;
            }
            for outcome in &market.outcomes {
                let Some(side) = side_for(&game, market_type, &outcome.name) else {
                    debug!(
                        game_id = %game.id,
                        bookmaker = %book.key,
                        outcome = %outcome.name,
                        "Unrecognised outcome dropped"
                    );
                    continue;
                };
                quotes.push(Quote {
                    game_id: game.id.clone(),
                    bookmaker: book.key.clone(),
                    market_type,
                    side,
                    price: outcome.price,
                    point: match market_type {
                        MarketType::Moneyline => None,
                        _ => outcome.point,
                    },
                });
            }
        }
    }

    GameSlate {
        game_id: game.id,
        home_team: game.home_team,
        away_team: game.away_team,
        start_time: game.commence_time,
        quotes,
    }
}

fn side_for(game: &ApiGame, market_type: MarketType, name: &str) -> Option<Side> {
    match market_type {
        MarketType::Moneyline | MarketType::Spread => {
            if name == game.home_team {
                Some(Side::Home)
            } else if name == game.away_team {
                Some(Side::Away)
            } else {
                None
            }
        }
        MarketType::Total => {
            if name.eq_ignore_ascii_case("over") {
                Some(Side::Over)
            } else if name.eq_ignore_ascii_case("under") {
                Some(Side::Under)
            } else {
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
      {
        "id": "abc123",
        "sport_key": "basketball_nba",
        "commence_time": "2026-10-14T23:30:00Z",
        "home_team": "Boston Celtics",
        "away_team": "Miami Heat",
        "bookmakers": [
          {
            "key": "draftkings",
            "title": "DraftKings",
            "markets": [
              {"key": "h2h", "outcomes": [
                {"name": "Boston Celtics", "price": 1.45},
                {"name": "Miami Heat", "price": 2.85}
              ]},
              {"key": "spreads", "outcomes": [
                {"name": "Boston Celtics", "price": 1.91, "point": -7.5},
                {"name": "Miami Heat", "price": 1.91, "point": 7.5}
              ]},
              {"key": "totals", "outcomes": [
                {"name": "Over", "price": 1.87, "point": 221.5},
                {"name": "Under", "price": 1.95, "point": 221.5}
              ]},
              {"key": "h2h_lay", "outcomes": [
                {"name": "Boston Celtics", "price": 1.5}
              ]}
            ]
          },
          {
            "key": "fanduel",
            "title": "FanDuel",
            "markets": [
              {"key": "h2h", "outcomes": [
                {"name": "Boston Celtics", "price": 1.44},
                {"name": "Draw", "price": 30.0},
                {"name": "Miami Heat", "price": 2.90}
              ]}
            ]
          }
        ]
      },
      {
        "id": "nobooks",
        "commence_time": "2026-10-15T00:00:00Z",
        "home_team": "Utah Jazz",
        "away_team": "Denver Nuggets"
      }
    ]"#;

    fn config() -> OddsApiConfig {
        OddsApiConfig::default()
    }

    fn client(config: OddsApiConfig) -> OddsApiClient {
        OddsApiClient::new(config, SecretString::new("test-key".into())).unwrap()
    }

    #[test]
    fn test_parse_and_convert() {
        let games: Vec<ApiGame> = serde_json::from_str(SAMPLE).unwrap();
        let slates = client(config()).to_slates(games);
        assert_eq!(slates.len(), 2);

        let g = &slates[0];
        assert_eq!(g.game_id, "abc123");
        assert_eq!(g.home_team, "Boston Celtics");
        // 6 DraftKings quotes + 2 FanDuel (the draw is dropped, h2h_lay ignored).
        assert_eq!(g.quotes.len(), 8);
        assert_eq!(g.quotes_for(MarketType::Total).count(), 2);

        let home_spread = g
            .quotes_for(MarketType::Spread)
            .find(|q| q.side == Side::Home)
            .unwrap();
        assert_eq!(home_spread.point, Some(-7.5));
        assert_eq!(home_spread.bookmaker, "draftkings");

        assert!(slates[1].quotes.is_empty());
    }

    #[test]
    fn test_bookmaker_and_market_filters() {
        let games: Vec<ApiGame> = serde_json::from_str(SAMPLE).unwrap();
        let slates = client(OddsApiConfig {
            bookmakers: vec!["fanduel".into()],
            markets: vec![MarketType::Moneyline],
            ..config()
        })
        .to_slates(games);
        let g = &slates[0];
        assert_eq!(g.quotes.len(), 2);
        assert!(g.quotes.iter().all(|q| q.bookmaker == "fanduel" && q.point.is_none()));
    }

    #[test]
    fn test_url_and_markets_param() {
        let c = client(OddsApiConfig {
            base_url: "https://api.the-odds-api.com/v4/".into(),
            ..config()
        });
        assert_eq!(c.odds_url(), "https://api.the-odds-api.com/v4/sports/basketball_nba/odds");
        assert_eq!(c.markets_param(), "h2h,spreads,totals");
        assert_eq!(c.name(), "the-odds-api");
    }

    #[test]
    fn test_malformed_game_is_a_parse_error() {
        let bad = r#"[{"id": "x", "commence_time": "soon", "home_team": "A", "away_team": "B"}]"#;
        assert!(serde_json::from_str::<Vec<ApiGame>>(bad).is_err());
    }

    #[tokio::test]
    async fn test_fetch_slate_over_http() {
        let (base_url, request) = crate::test_support::serve_once(200, SAMPLE).await;
        let c = client(OddsApiConfig { base_url, ..config() });

        let slates = c.fetch_slate().await.unwrap();
        assert_eq!(slates.len(), 2);
        assert_eq!(slates[0].quotes.len(), 8);

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /sports/basketball_nba/odds?"));
        assert!(request.contains("apiKey=test-key"));
        assert!(request.contains("oddsFormat=decimal"));
    }

    #[tokio::test]
    async fn test_error_status_is_a_provider_error() {
        let (base_url, _request) =
            crate::test_support::serve_once(401, r#"{"message":"Invalid API key"}"#).await;
        let err = client(OddsApiConfig { base_url, ..config() })
            .fetch_slate()
            .await
            .unwrap_err();

        match err.downcast_ref::<CourtsideError>() {
            Some(CourtsideError::Provider { provider, message }) => {
                assert_eq!(provider, "the-odds-api");
                assert!(message.starts_with("HTTP 401"));
                assert!(message.contains("Invalid API key"));
            }
            other => panic!("expected a provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_is_a_malformed_snapshot() {
        let (base_url, _request) = crate::test_support::serve_once(200, r#"{"not": "a list"}"#).await;
        let err = client(OddsApiConfig { base_url, ..config() })
            .fetch_slate()
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CourtsideError>(),
            Some(CourtsideError::MalformedSnapshot { .. })
        ));
    }
}
