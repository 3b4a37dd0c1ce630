//! End-to-end integration tests
//!
//! Drives a full paper-trading session through the public API: bars are
//! injected into the feed, ticks run the whole decide/execute/persist path,
//! and the persisted snapshots are checked against the dashboard schema.

use microscalp::config::Config;
use microscalp::engine::{TickOutcome, TradingEngine};
use microscalp::execution::PaperExecutor;
use microscalp::feed::{Bar, MarketDataFeed};
use microscalp::features::FeatureVector;
use microscalp::risk::ExitReason;
use microscalp::signal::{Side, SignalModel};
use std::sync::Arc;
use tempfile::TempDir;

struct FixedModel(f64);

impl SignalModel for FixedModel {
    fn predict(&self, _features: &FeatureVector) -> anyhow::Result<f64> {
        Ok(self.0)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.engine.state_file = dir.path().join("shared_state.json");
    config.engine.klines_file = dir.path().join("latest_klines.json");
    config
}

fn bar(i: i64, close: f64) -> Bar {
    Bar {
        open_time_ms: i * 1000,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1.0,
    }
}

#[test]
fn test_example_config_loads() {
    let config: Config = toml::from_str(include_str!("../config.toml.example")).unwrap();
    assert_eq!(config.primary_symbol().unwrap(), "BTCUSDT");
    assert_eq!(config.feed.buffer_capacity, 60);
    assert_eq!(config.trading.strong_signal_confidence, 0.7);
}

#[tokio::test]
async fn test_full_trade_cycle_paper() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    let feed = MarketDataFeed::new(config.trading.symbols.clone(), config.feed.clone());
    // Enough history for all five features, with a final uptick
    for i in 0..11 {
        feed.push_bar("BTCUSDT", bar(i, 100.0)).await;
    }
    feed.push_bar("BTCUSDT", bar(11, 101.0)).await;

    let executor = Arc::new(PaperExecutor::new(1000.0));
    let mut engine =
        TradingEngine::new(&config, feed, Box::new(FixedModel(0.8)), executor.clone()).unwrap();

    // Strong buy signal opens a position sized at 5% of the portfolio
    assert_eq!(engine.tick(12.0).await, TickOutcome::Opened(Side::Buy));
    let fills = executor.fills().await;
    assert_eq!(fills.len(), 1);
    assert!((fills[0].0.quantity - 0.49505).abs() < 1e-9);

    // Both snapshots hit disk with the expected schema
    let state_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.engine.state_file).unwrap()).unwrap();
    assert_eq!(state_json["portfolio_value_usdt"], 1000.0);
    assert_eq!(state_json["active_position"]["side"], "buy");
    assert!(state_json["active_position"]["open_time"].is_number());
    assert_eq!(state_json["last_signal"]["side"], "buy");

    let klines_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.engine.klines_file).unwrap())
            .unwrap();
    assert_eq!(klines_json["symbol"], "BTCUSDT");
    assert_eq!(klines_json["klines"].as_array().unwrap().len(), 12);
    assert!(klines_json["klines"][0]["c"].is_number());

    // Price collapses through the 0.5% stop
    engine.feed().push_bar("BTCUSDT", bar(12, 100.0)).await;
    assert_eq!(
        engine.tick(13.0).await,
        TickOutcome::Closed(ExitReason::StopLoss)
    );

    let state = engine.state();
    assert!(state.active_position.is_none());
    let expected = 1000.0 + (100.0 - 101.0) * 0.49505;
    assert!((state.value_usdt - expected).abs() < 1e-9);
    assert_eq!(state.last_close_time_secs, 13.0);

    // Cooldown: the very next second is blocked even with a strong signal
    assert_eq!(engine.tick(14.0).await, TickOutcome::Hold);
    assert_eq!(executor.fills().await.len(), 2);

    // After the 3s cooldown a new entry goes through
    assert_eq!(engine.tick(16.1).await, TickOutcome::Opened(Side::Buy));
    assert_eq!(executor.fills().await.len(), 3);
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    {
        let feed = MarketDataFeed::new(config.trading.symbols.clone(), config.feed.clone());
        for i in 0..11 {
            feed.push_bar("BTCUSDT", bar(i, 100.0)).await;
        }
        feed.push_bar("BTCUSDT", bar(11, 101.0)).await;

        let executor = Arc::new(PaperExecutor::new(1000.0));
        let mut engine =
            TradingEngine::new(&config, feed, Box::new(FixedModel(0.8)), executor).unwrap();
        assert_eq!(engine.tick(12.0).await, TickOutcome::Opened(Side::Buy));
    }

    // A fresh engine picks the open position back up from the snapshot
    let feed = MarketDataFeed::new(config.trading.symbols.clone(), config.feed.clone());
    feed.push_bar("BTCUSDT", bar(12, 101.0)).await;
    let executor = Arc::new(PaperExecutor::new(1000.0));
    let mut engine =
        TradingEngine::new(&config, feed, Box::new(FixedModel(0.5)), executor.clone()).unwrap();

    let pos = engine.state().active_position.clone().unwrap();
    assert_eq!(pos.entry_price, 101.0);

    // Stale position times out and closes on the restarted engine
    assert_eq!(
        engine.tick(50.0).await,
        TickOutcome::Closed(ExitReason::Timeout)
    );
    assert_eq!(executor.fills().await.len(), 1);
}
