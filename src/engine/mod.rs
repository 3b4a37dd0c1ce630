//! Trading engine: the 1-second decision loop
//!
//! Each tick reads the newest bar, evaluates the classifier, runs the risk
//! gates, and (at most) places one order. All position state mutation happens
//! here, serially, which is what keeps the single-writer snapshot discipline
//! honest.

use crate::config::Config;
use crate::data::KlineSnapshot;
use crate::execution::{Order, OrderExecutor};
use crate::features;
use crate::feed::MarketDataFeed;
use crate::risk::{ExitReason, Position, RiskManager};
use crate::signal::{SignalModel, SignalPredictor};
use crate::telemetry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a single tick decided
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No bar has arrived yet
    NoData,
    /// Nothing actionable this tick
    Hold,
    /// Opened a position on the given side
    Opened(crate::signal::Side),
    /// Closed the position for the given reason
    Closed(ExitReason),
}

/// The single-symbol scalping engine
pub struct TradingEngine {
    symbol: String,
    trading: crate::config::TradingConfig,
    tick_secs: f64,
    klines_file: PathBuf,
    window_len: usize,
    feed: MarketDataFeed,
    predictor: SignalPredictor,
    executor: Arc<dyn OrderExecutor>,
    risk: RiskManager,
}

impl TradingEngine {
    /// Assemble an engine from configuration and its collaborators
    pub fn new(
        config: &Config,
        feed: MarketDataFeed,
        model: Box<dyn SignalModel>,
        executor: Arc<dyn OrderExecutor>,
    ) -> anyhow::Result<Self> {
        let symbol = config.primary_symbol()?;
        let risk = RiskManager::new(
            config.trading.clone(),
            config.risk.clone(),
            config.engine.state_file.clone(),
        );

        Ok(Self {
            symbol,
            trading: config.trading.clone(),
            tick_secs: config.engine.tick_secs,
            klines_file: config.engine.klines_file.clone(),
            window_len: config.feed.buffer_capacity,
            feed,
            predictor: SignalPredictor::new(model),
            executor,
            risk,
        })
    }

    /// Current portfolio state
    pub fn state(&self) -> &crate::risk::PortfolioState {
        self.risk.state()
    }

    /// The engine's market data feed (bar injection point for replays)
    pub fn feed(&self) -> &MarketDataFeed {
        &self.feed
    }

    /// One decision cycle at `now_secs` (epoch seconds)
    pub async fn tick(&mut self, now_secs: f64) -> TickOutcome {
        self.risk.reload();
        if let Some(dt) = chrono::DateTime::from_timestamp(now_secs as i64, 0) {
            self.risk.roll_daily_window(dt.date_naive());
        }

        let Some(bar) = self.feed.latest(&self.symbol).await else {
            self.persist(&[], now_secs);
            return TickOutcome::NoData;
        };
        let price = bar.close;
        let window = self.feed.window(&self.symbol, self.window_len).await;

        let signal = match features::extract(&window) {
            Some(features) => self.predictor.signal(&features, price, now_secs),
            None => crate::signal::Signal::neutral(price, now_secs),
        };
        self.risk.set_last_signal(signal);

        let outcome = if let Some(pos) = self.risk.active_position().cloned() {
            match self.risk.check_exit(price, now_secs) {
                Some(reason) => self.close_position(&pos, reason, price, now_secs).await,
                None => TickOutcome::Hold,
            }
        } else {
            self.try_open(&signal, price, now_secs).await
        };

        self.persist(&window, now_secs);
        outcome
    }

    /// Attempt an entry when the signal and the risk gates all allow it
    async fn try_open(
        &mut self,
        signal: &crate::signal::Signal,
        price: f64,
        now_secs: f64,
    ) -> TickOutcome {
        let Some(side) = signal.direction.as_side() else {
            return TickOutcome::Hold;
        };
        // Strictly exceed: a signal sitting exactly on the threshold stays out
        if signal.confidence <= self.trading.strong_signal_confidence {
            return TickOutcome::Hold;
        }
        if !self.risk.cooldown_elapsed(now_secs) {
            tracing::debug!(symbol = %self.symbol, "Entry suppressed by cooldown");
            return TickOutcome::Hold;
        }
        if !self.risk.can_open(&self.symbol) {
            return TickOutcome::Hold;
        }

        let quantity = self.risk.position_size(&self.symbol, price);
        let order = Order {
            symbol: self.symbol.clone(),
            side,
            quantity,
            price,
        };

        match self.executor.place_market_order(&order).await {
            Ok(fill) => {
                let entry_price = fill.avg_price.unwrap_or(price);
                self.risk.open_position(Position {
                    symbol: self.symbol.clone(),
                    side,
                    quantity,
                    entry_price,
                    open_time_secs: now_secs,
                    order_id: fill.order_id,
                });
                tracing::info!(
                    symbol = %self.symbol,
                    side = side.as_order_str(),
                    qty = quantity,
                    entry_price,
                    confidence = signal.confidence,
                    "Opened position"
                );
                TickOutcome::Opened(side)
            }
            Err(e) => {
                tracing::warn!(symbol = %self.symbol, error = %e, "Entry order failed");
                self.risk.record_error(format!("entry failed: {e}"));
                TickOutcome::Hold
            }
        }
    }

    /// Close the open position for the given exit reason
    async fn close_position(
        &mut self,
        pos: &Position,
        reason: ExitReason,
        price: f64,
        now_secs: f64,
    ) -> TickOutcome {
        let order = Order {
            symbol: pos.symbol.clone(),
            side: pos.side.opposite(),
            quantity: pos.quantity,
            price,
        };

        match self.executor.place_market_order(&order).await {
            Ok(fill) => {
                let close_price = fill.avg_price.unwrap_or(price);
                self.risk
                    .apply_close(close_price, pos.side, pos.quantity, pos.entry_price);
                self.risk.set_last_close_time(now_secs);
                tracing::info!(
                    symbol = %pos.symbol,
                    %reason,
                    close_price,
                    age_secs = pos.age_secs(now_secs),
                    "Closed position"
                );
                TickOutcome::Closed(reason)
            }
            Err(e) => {
                // The position stays open; the next tick retries the exit
                tracing::warn!(symbol = %pos.symbol, error = %e, "Exit order failed");
                self.risk.record_error(format!("exit failed: {e}"));
                TickOutcome::Hold
            }
        }
    }

    /// Write both snapshots; failures are logged, never fatal
    fn persist(&mut self, window: &[crate::feed::Bar], now_secs: f64) {
        if let Err(e) = self.risk.persist() {
            tracing::warn!(error = %e, "Failed to persist portfolio state");
        }
        if !window.is_empty() {
            let snapshot = KlineSnapshot::new(&self.symbol, window, now_secs);
            if let Err(e) = snapshot.save(&self.klines_file) {
                tracing::warn!(error = %e, "Failed to persist kline snapshot");
            }
        }
    }

    /// Run until Ctrl-C: start the feed, tick on a fixed cadence, then drain
    pub async fn run(&mut self) -> anyhow::Result<()> {
        tracing::info!(
            symbol = %self.symbol,
            tick_secs = self.tick_secs,
            "Starting trading engine"
        );
        self.feed.start();

        let mut interval = tokio::time::interval(Duration::from_secs_f64(self.tick_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let started = Instant::now();
                    let outcome = self.tick(now_secs()).await;
                    telemetry::observe_tick(started.elapsed(), &format!("{outcome:?}"));
                }
                result = &mut shutdown => {
                    result?;
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Stop the feed, cancel resting orders, persist a final snapshot
    async fn shutdown(&mut self) {
        self.feed.stop().await;

        if let Err(e) = self.executor.cancel_all_orders(&self.symbol).await {
            tracing::warn!(error = %e, "Cancel-all on shutdown failed");
        }
        if let Err(e) = self.risk.persist() {
            tracing::warn!(error = %e, "Final state persist failed");
        }
        tracing::info!("Engine stopped");
    }
}

/// Wall-clock time in epoch seconds
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
