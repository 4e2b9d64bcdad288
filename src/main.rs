//! COURTSIDE: basketball betting slate scorer
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the line history, and runs a single fetch → evaluate → deliver
//! pass. Exits non-zero when the run cannot complete.

use anyhow::Result;
use chrono::{Duration, Utc};
use secrecy::SecretString;
use tracing::{error, info, warn};

use courtside::alerts::{MessageRenderer, Notifier, StdoutNotifier, WebhookNotifier};
use courtside::config::AppConfig;
use courtside::data::odds_api::OddsApiClient;
use courtside::engine::Pipeline;
use courtside::storage::{JsonLineStore, LineStore, MemoryLineStore};
use courtside::strategy::StrategyOrchestrator;

const BANNER: &str = r#"
  ___ ___  _   _ ___ _____ ___ ___ ___  ___
 / __/ _ \| | | | _ \_   _/ __|_ _|   \| __|
| (_| (_) | |_| |   / | | \__ \| || |) | _|
 \___\___/ \___/|_|_\ |_| |___/___|___/|___|

  De-vigged edges and Kelly stakes for the daily slate
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "COURTSIDE run failed");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("COURTSIDE_CONFIG").ok())
        .unwrap_or_else(|| "config.toml".to_string());
    let cfg = AppConfig::load(&config_path)?;

    println!("{BANNER}");
    info!(
        config = %config_path,
        sport = %cfg.odds_api.sport,
        mode = ?cfg.model.selection.mode,
        locale = ?cfg.display.locale,
        "COURTSIDE starting up"
    );

    // -- Components -------------------------------------------------------

    let api_key = AppConfig::resolve_secret(&cfg.odds_api.api_key_env)?;
    let provider = OddsApiClient::new(cfg.odds_api.clone(), api_key)?;

    let webhook_url = cfg
        .alerts
        .webhook_url_env
        .as_deref()
        .and_then(|env| AppConfig::resolve_env(env).ok())
        .filter(|url| !url.trim().is_empty())
        .map(SecretString::new);
    let notifier: Box<dyn Notifier> = match webhook_url {
        Some(url) => Box::new(WebhookNotifier::new(url, cfg.alerts.timeout_secs)?),
        None => {
            warn!("No webhook configured, printing recommendations to stdout");
            Box::new(StdoutNotifier)
        }
    };

    let mut history: Box<dyn LineStore> = if cfg.history.enabled {
        Box::new(
            JsonLineStore::open_or_fresh(&cfg.history.path)
                .with_retention(Duration::days(cfg.history.retention_days)),
        )
    } else {
        info!("Line history disabled");
        Box::new(MemoryLineStore::default())
    };

    let pipeline = Pipeline::new(
        Box::new(provider),
        StrategyOrchestrator::new(cfg.model.clone()),
        MessageRenderer::new(cfg.display.clone()),
        notifier,
        cfg.alerts.max_chunk_chars,
    );

    // -- Run --------------------------------------------------------------

    let report = pipeline.run_once(history.as_mut(), Utc::now()).await?;

    for pick in &report.recommendation.picks {
        info!(run_id = %report.run_id, "Pick: {pick}");
    }
    if let Some(e) = &report.history_error {
        warn!(run_id = %report.run_id, error = %e, "Line history not saved");
    }
    if let Some(e) = &report.delivery.error {
        warn!(run_id = %report.run_id, error = %e, "Recommendations not fully delivered");
    }

    info!(run_id = %report.run_id, "COURTSIDE finished");
    Ok(())
}

/// Initialise the tracing subscriber.
///
/// Respects `RUST_LOG`; defaults to `courtside=info`. Set
/// `COURTSIDE_LOG_JSON=1` for JSON lines.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("courtside=info"));

    let json_logging = std::env::var("COURTSIDE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
