//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section falls back to defaults, so a minimal file is valid.
//! Secrets (API key, webhook URL) are referenced by env-var name in the
//! config and resolved at runtime into `SecretString`s.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::storage::DEFAULT_HISTORY_FILE;
use crate::strategy::ModelConfig;
use crate::types::{CourtsideError, MarketType};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub odds_api: OddsApiConfig,
    pub model: ModelConfig,
    pub history: HistoryConfig,
    pub alerts: AlertsConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OddsApiConfig {
    pub base_url: String,
    /// Provider sport key, e.g. `basketball_nba`.
    pub sport: String,
    /// Comma-separated bookmaker regions, e.g. `us` or `us,eu`.
    pub regions: String,
    pub markets: Vec<MarketType>,
    /// Restrict to these bookmaker keys. Empty means all.
    pub bookmakers: Vec<String>,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for OddsApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.the-odds-api.com/v4".into(),
            sport: "basketball_nba".into(),
            regions: "us".into(),
            markets: MarketType::ALL.to_vec(),
            bookmakers: Vec::new(),
            api_key_env: "ODDS_API_KEY".into(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub path: String,
    /// Entries older than this are dropped on save.
    pub retention_days: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: DEFAULT_HISTORY_FILE.into(),
            retention_days: 7,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AlertsConfig {
    /// Env var holding the webhook URL. Unset → print to stdout.
    pub webhook_url_env: Option<String>,
    pub max_chunk_chars: usize,
    pub timeout_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            webhook_url_env: Some("WEBHOOK_URL".into()),
            max_chunk_chars: 1900,
            timeout_secs: 10,
        }
    }
}

/// Language used for team names in messages.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh-TW")]
    TraditionalChinese,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub title: String,
    pub locale: Locale,
    /// Per-team overrides on top of the locale table.
    pub team_names: HashMap<String, String>,
    pub show_observed: bool,
    pub show_all_games: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "COURTSIDE picks".into(),
            locale: Locale::English,
            team_names: HashMap::new(),
            show_observed: true,
            show_all_games: true,
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve an env-var reference into a secret.
    pub fn resolve_secret(env_name: &str) -> Result<SecretString> {
        Self::resolve_env(env_name).map(SecretString::new)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), CourtsideError> {
        let m = &self.model;
        let bad = |msg: String| Err(CourtsideError::Config(msg));

        let p = &m.probability;
        if !(0.0 < p.clip_min && p.clip_min < p.clip_max && p.clip_max < 1.0) {
            return bad(format!("clip band [{}, {}] must sit inside (0, 1)", p.clip_min, p.clip_max));
        }
        if m.projection.spread_coefficient < 0.0 || m.projection.total_coefficient < 0.0 {
            return bad("projection coefficients must be non-negative".into());
        }
        if let Some(buy) = &m.projection.point_buy {
            if buy.bridge_min > buy.bridge_max {
                return bad("point_buy.bridge_min exceeds bridge_max".into());
            }
            if buy.price_factor <= 0.0 {
                return bad("point_buy.price_factor must be positive".into());
            }
        }
        if !(1.0 < m.edge.odds_min && m.edge.odds_min < m.edge.odds_max) {
            return bad(format!(
                "odds band [{}, {}] must satisfy 1 < odds_min < odds_max",
                m.edge.odds_min, m.edge.odds_max
            ));
        }
        if !(m.staking.kelly_fraction > 0.0 && m.staking.kelly_fraction <= 1.0) {
            return bad("kelly_fraction must be in (0, 1]".into());
        }
        if !(m.staking.kelly_cap > 0.0 && m.staking.kelly_cap <= 1.0) {
            return bad("kelly_cap must be in (0, 1]".into());
        }
        if m.selection.top_n == Some(0) {
            return bad("top_n must be at least 1 when set".into());
        }
        if m.selection.tiers.top < m.selection.tiers.mid {
            return bad("tier bands must satisfy top >= mid".into());
        }
        if self.odds_api.markets.is_empty() {
            return bad("odds_api.markets must name at least one market".into());
        }
        if self.alerts.max_chunk_chars == 0 {
            return bad("alerts.max_chunk_chars must be positive".into());
        }
        Ok(())
    }
}
