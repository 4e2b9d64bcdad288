//! Market data providers.
//!
//! Defines the `OddsProvider` trait and The Odds API implementation that
//! turns bookmaker JSON into `GameSlate`s.

pub mod odds_api;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::GameSlate;

/// Abstraction over sources of bookmaker prices.
///
/// A failed fetch is fatal for the run; implementors do not retry.
#[async_trait]
pub trait OddsProvider: Send + Sync {
    /// Fetch the current slate of games with every quote.
    async fn fetch_slate(&self) -> Result<Vec<GameSlate>>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}
