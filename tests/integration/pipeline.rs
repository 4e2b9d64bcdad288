//! Full-run scenarios against the mock provider.

use chrono::{Duration, Utc};
use std::path::PathBuf;

use courtside::alerts::MessageRenderer;
use courtside::config::{AppConfig, DisplayConfig, Locale};
use courtside::engine::Pipeline;
use courtside::storage::{JsonLineStore, LineStore, MemoryLineStore};
use courtside::strategy::selection::SelectionMode;
use courtside::strategy::{ModelConfig, StrategyOrchestrator};
use courtside::types::{MarketType, Side, SkipReason, Tier};

use crate::mock_provider::*;

fn pipeline(
    provider: &MockProvider,
    notifier: &RecordingNotifier,
    model: ModelConfig,
    display: DisplayConfig,
    max_chunk_chars: usize,
) -> Pipeline {
    Pipeline::new(
        Box::new(provider.clone()),
        StrategyOrchestrator::new(model),
        MessageRenderer::new(display),
        Box::new(notifier.clone()),
        max_chunk_chars,
    )
}

fn default_pipeline(provider: &MockProvider, notifier: &RecordingNotifier) -> Pipeline {
    pipeline(provider, notifier, ModelConfig::default(), DisplayConfig::default(), 1900)
}

fn temp_history() -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("courtside_it_lines_{}.json", uuid::Uuid::new_v4()));
    p
}

#[tokio::test]
async fn test_default_slate_end_to_end() {
    let provider = MockProvider::new(default_slate());
    let notifier = RecordingNotifier::default();
    let mut history = MemoryLineStore::default();

    let report = default_pipeline(&provider, &notifier)
        .run_once(&mut history, Utc::now())
        .await
        .unwrap();

    assert_eq!(report.provider, "mock");
    assert_eq!(report.games, 3);

    let picks = &report.recommendation.picks;
    assert_eq!(picks.len(), 1);
    assert_eq!(picks[0].game_id, "MOCK-BOS-MIA");
    assert_eq!(picks[0].market_type, MarketType::Spread);
    assert_eq!(picks[0].side, Side::Home);
    assert_eq!(picks[0].tier, Some(Tier::Mid));
    assert!(picks[0].stake_fraction > 0.0 && picks[0].stake_fraction <= 0.05);

    let skipped = &report.recommendation.skipped;
    assert_eq!(skipped.len(), 2);
    assert!(skipped
        .iter()
        .any(|s| s.game_id == "MOCK-UTA-DEN" && s.reason == SkipReason::NoCandidates));
    assert!(skipped
        .iter()
        .any(|s| s.game_id == "MOCK-LAL-GSW" && s.reason == SkipReason::MissingMoneyline(Side::Away)));

    // The game that could not be modelled leaves no history.
    assert_eq!(history.len(), 2);
    assert!(history.get("MOCK-LAL-GSW").is_none());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("__Recommended__"));
    assert!(sent[0].contains("Spread Boston Celtics -2.5 @ 2.10 [mockbook]"));
    assert!(report.delivery.is_complete());
}

#[tokio::test]
async fn test_empty_slate_reports_no_candidates() {
    let provider = MockProvider::new(vec![]);
    let notifier = RecordingNotifier::default();
    let mut history = MemoryLineStore::default();

    let report = default_pipeline(&provider, &notifier)
        .run_once(&mut history, Utc::now())
        .await
        .unwrap();

    assert!(report.recommendation.is_empty());
    assert!(report.recommendation.observed.is_empty());
    assert!(history.is_empty());
    assert!(notifier.sent()[0].contains("No games today"));
}

#[tokio::test]
async fn test_fetch_error_aborts_before_anything_is_written() {
    let provider = MockProvider::new(default_slate());
    provider.set_error("odds provider unreachable");
    let notifier = RecordingNotifier::default();

    let path = temp_history();
    let mut history = JsonLineStore::open(&path).unwrap();

    let err = default_pipeline(&provider, &notifier)
        .run_once(&mut history, Utc::now())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("odds provider unreachable"));
    assert!(notifier.sent().is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_delivery_failure_still_saves_history() {
    let provider = MockProvider::new(default_slate());
    let notifier = RecordingNotifier::default();
    notifier.fail_all();

    let path = temp_history();
    let mut history = JsonLineStore::open(&path).unwrap();

    let report = default_pipeline(&provider, &notifier)
        .run_once(&mut history, Utc::now())
        .await
        .unwrap();

    assert!(!report.delivery.is_complete());
    assert!(report.delivery.error.as_deref().unwrap().contains("HTTP 500"));
    assert_eq!(report.recommendation.picks.len(), 1);

    let reopened = JsonLineStore::open(&path).unwrap();
    assert_eq!(reopened.len(), 2);
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_corrupt_history_still_recommends() {
    let provider = MockProvider::new(default_slate());
    let notifier = RecordingNotifier::default();

    let path = temp_history();
    std::fs::write(&path, "{ truncated").unwrap();
    let mut history = JsonLineStore::open_or_fresh(&path);

    let report = default_pipeline(&provider, &notifier)
        .run_once(&mut history, Utc::now())
        .await
        .unwrap();

    assert_eq!(report.recommendation.picks.len(), 1);
    assert!(report
        .history_error
        .as_deref()
        .unwrap()
        .contains("Failed to parse line history"));
    assert!(report.delivery.is_complete());

    let rewritten = JsonLineStore::open(&path).unwrap();
    assert_eq!(rewritten.len(), 2);
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_line_movement_across_runs_adds_a_signal() {
    let model = ModelConfig {
        selection: courtside::strategy::selection::SelectionConfig {
            mode: SelectionMode::MultiSignal,
            ..Default::default()
        },
        ..ModelConfig::default()
    };
    let provider = MockProvider::new(vec![celtics_heat(-2.5)]);
    let notifier = RecordingNotifier::default();
    let run = pipeline(&provider, &notifier, model, DisplayConfig::default(), 1900);
    let path = temp_history();
    let now = Utc::now();

    // First sighting: only the spread signal, one short of two.
    let mut history = JsonLineStore::open(&path).unwrap().with_retention(Duration::days(7));
    let first = run.run_once(&mut history, now).await.unwrap();
    assert!(first.recommendation.is_empty());
    assert_eq!(first.recommendation.observed.len(), 1);

    // The home line moves from -2.5 to -4.0: the market followed the home side.
    provider.set_slate(vec![celtics_heat(-4.0)]);
    let mut history = JsonLineStore::open(&path).unwrap().with_retention(Duration::days(7));
    let second = run
        .run_once(&mut history, now + Duration::hours(3))
        .await
        .unwrap();

    let picks = &second.recommendation.picks;
    assert_eq!(picks.len(), 1);
    assert_eq!(picks[0].market_type, MarketType::Spread);
    assert_eq!(picks[0].side, Side::Home);
    assert_eq!(picks[0].point, Some(-4.0));
    assert_eq!(picks[0].signals, 2);

    let stored = JsonLineStore::open(&path).unwrap();
    assert_eq!(stored.get("MOCK-BOS-MIA").unwrap().point, Some(-4.0));
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_chunks_arrive_in_order_and_within_limit() {
    let slate: Vec<_> = (0..12)
        .map(|i| celtics_heat_as(&format!("MOCK-{i:02}"), -2.5))
        .collect();
    let provider = MockProvider::new(slate);
    let notifier = RecordingNotifier::default();
    let display = DisplayConfig {
        locale: Locale::TraditionalChinese,
        ..DisplayConfig::default()
    };
    let mut history = MemoryLineStore::default();

    let report = pipeline(&provider, &notifier, ModelConfig::default(), display, 200)
        .run_once(&mut history, Utc::now())
        .await
        .unwrap();

    let sent = notifier.sent();
    assert!(sent.len() > 1);
    assert_eq!(sent.len(), report.delivery.chunks_total);
    assert!(sent.iter().all(|c| c.chars().count() <= 200));

    let full = sent.concat();
    assert!(full.starts_with("**🏀 COURTSIDE picks"));
    assert!(full.contains("熱火 @ 塞爾提克"));
    let recommended = full.find("__Recommended__").unwrap();
    let all_games = full.find("__All games__").unwrap();
    assert!(recommended < all_games);
}

#[test]
fn test_shipped_config_parses() {
    let cfg = AppConfig::from_toml(include_str!("../../config.toml")).unwrap();
    assert_eq!(cfg.model, ModelConfig::default());
    assert_eq!(cfg.alerts.max_chunk_chars, 1900);
}
