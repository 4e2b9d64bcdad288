//! Core engine: one fetch → evaluate → persist → render → deliver run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::alerts::{chunk_message, deliver, DeliveryReport, MessageRenderer, Notifier};
use crate::data::OddsProvider;
use crate::storage::LineStore;
use crate::strategy::StrategyOrchestrator;
use crate::types::Recommendation;

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Summary of one completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub provider: String,
    pub games: usize,
    pub recommendation: Recommendation,
    /// Set when the line history could not be loaded or written.
    pub history_error: Option<String>,
    pub delivery: DeliveryReport,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "Run {} | games: {} | picks: {} | observed: {} | skipped: {} | delivered: {}/{}",
            self.run_id,
            self.games,
            self.recommendation.picks.len(),
            self.recommendation.observed.len(),
            self.recommendation.skipped.len(),
            self.delivery.chunks_sent,
            self.delivery.chunks_total,
        )
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Everything one run needs apart from the line history.
pub struct Pipeline {
    provider: Box<dyn OddsProvider>,
    orchestrator: StrategyOrchestrator,
    renderer: MessageRenderer,
    notifier: Box<dyn Notifier>,
    max_chunk_chars: usize,
}

impl Pipeline {
    pub fn new(
        provider: Box<dyn OddsProvider>,
        orchestrator: StrategyOrchestrator,
        renderer: MessageRenderer,
        notifier: Box<dyn Notifier>,
        max_chunk_chars: usize,
    ) -> Self {
        Self {
            provider,
            orchestrator,
            renderer,
            notifier,
            max_chunk_chars,
        }
    }

    /// Run once against `history`.
    ///
    /// A failed fetch aborts the run before anything is evaluated or
    /// written. History and delivery failures are reported, not raised.
    pub async fn run_once(&self, history: &mut dyn LineStore, now: DateTime<Utc>) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let provider = self.provider.name().to_string();
        info!(run_id = %run_id, provider = %provider, "Run started");

        let slate = self
            .provider
            .fetch_slate()
            .await
            .with_context(|| format!("Failed to fetch slate from {provider}"))?;
        info!(run_id = %run_id, games = slate.len(), "Slate fetched");

        let evaluation = self.orchestrator.evaluate(&slate, &*history, now);

        for (game_id, snapshot) in &evaluation.observed_lines {
            history.put(game_id, *snapshot);
        }
        let persist_error = match history.persist(now) {
            Ok(()) => None,
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Failed to persist line history");
                Some(format!("{e:#}"))
            }
        };
        let history_error = match (history.load_error(), persist_error) {
            (Some(load), Some(persist)) => Some(format!("{load}; {persist}")),
            (Some(load), None) => Some(load.to_string()),
            (None, persist) => persist,
        };

        let text = self
            .renderer
            .render(&slate, &evaluation, self.orchestrator.staking(), now.date_naive());
        let chunks = chunk_message(&text, self.max_chunk_chars);
        let delivery = deliver(self.notifier.as_ref(), &chunks).await;

        let report = RunReport {
            run_id,
            started_at: now,
            provider,
            games: slate.len(),
            recommendation: evaluation.recommendation,
            history_error,
            delivery,
        };
        info!(run_id = %run_id, "{}", report.summary());
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
