//! Risk manager: position gating, sizing, and exit rules

use super::state::{PortfolioState, Position};
use super::types::{ExitReason, RiskError};
use crate::config::{RiskConfig, TradingConfig};
use crate::execution::SymbolFilters;
use crate::signal::{Side, Signal};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Minimum order notional accepted by the exchange, in quote currency
pub const MIN_NOTIONAL_USDT: f64 = 10.0;

/// Owns the portfolio state and every trading-risk decision
///
/// All mutation happens inside the engine's serial tick, which is what makes
/// the single-writer discipline hold: the manager owns the state by value and
/// nothing else in the process touches it.
pub struct RiskManager {
    trading: TradingConfig,
    risk: RiskConfig,
    state_file: PathBuf,
    state: PortfolioState,
}

impl RiskManager {
    /// Create a manager, loading the snapshot or starting fresh
    pub fn new(trading: TradingConfig, risk: RiskConfig, state_file: PathBuf) -> Self {
        let state = PortfolioState::load(&state_file).unwrap_or_else(|_| {
            tracing::info!(path = %state_file.display(), "No snapshot found, starting fresh");
            PortfolioState::with_value(risk.initial_portfolio_usdt)
        });

        Self {
            trading,
            risk,
            state_file,
            state,
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    /// The open position, if any
    pub fn active_position(&self) -> Option<&Position> {
        self.state.active_position.as_ref()
    }

    /// Re-read the snapshot from disk at tick start
    ///
    /// Best effort: an unreadable file keeps the in-memory state, which is
    /// authoritative within the process.
    pub fn reload(&mut self) {
        match PortfolioState::load(&self.state_file) {
            Ok(state) => self.state = state,
            Err(e) => tracing::debug!(error = %e, "Keeping in-memory state"),
        }
    }

    /// Write the snapshot atomically
    pub fn persist(&self) -> Result<(), RiskError> {
        self.state.save(&self.state_file)
    }

    /// Reset the daily P&L counter when the UTC day rolls over
    pub fn roll_daily_window(&mut self, today: NaiveDate) {
        match self.state.daily_anchor_date {
            Some(anchor) if anchor == today => {}
            Some(_) => {
                tracing::info!(%today, "New trading day, resetting daily P&L");
                self.state.daily_pnl_pct = 0.0;
                self.state.daily_anchor_date = Some(today);
            }
            None => {
                self.state.daily_anchor_date = Some(today);
            }
        }
    }

    /// Whether a new position may open: flat and under the daily loss limit
    pub fn can_open(&self, _symbol: &str) -> bool {
        if self.state.active_position.is_some() {
            return false;
        }
        if self.state.daily_pnl_pct <= -self.risk.daily_loss_limit_pct {
            return false;
        }
        true
    }

    /// Quantity for a new position at the given price
    ///
    /// Target notional is a percentage of portfolio value, clamped to the
    /// symbol's minimum quantity and rounded to its step precision. If the
    /// rounded notional falls under the exchange minimum, the quantity is
    /// recomputed from that minimum, rounded up so the floor holds, and
    /// clamped once more.
    pub fn position_size(&self, symbol: &str, price: f64) -> f64 {
        let filters = SymbolFilters::for_symbol(symbol);
        let notional = self.state.value_usdt * self.trading.position_size_pct / 100.0;

        let mut qty = notional / price;
        qty = filters.round_qty(qty.max(filters.min_qty));

        if qty * price < MIN_NOTIONAL_USDT {
            qty = filters.ceil_qty(MIN_NOTIONAL_USDT / price);
            qty = qty.max(filters.min_qty);
        }

        qty
    }

    /// Exit decision for the open position at the given price and time
    ///
    /// Price triggers win over the timeout: the holding-age check only runs
    /// when neither stop-loss nor take-profit fired this tick.
    pub fn check_exit(&self, price: f64, now_secs: f64) -> Option<ExitReason> {
        let pos = self.state.active_position.as_ref()?;

        let sl = self.trading.stop_loss_pct / 100.0;
        let tp = self.trading.take_profit_pct / 100.0;
        let entry = pos.entry_price;

        match pos.side {
            Side::Buy => {
                if price <= entry * (1.0 - sl) {
                    return Some(ExitReason::StopLoss);
                }
                if price >= entry * (1.0 + tp) {
                    return Some(ExitReason::TakeProfit);
                }
            }
            Side::Sell => {
                if price >= entry * (1.0 + sl) {
                    return Some(ExitReason::StopLoss);
                }
                if price <= entry * (1.0 - tp) {
                    return Some(ExitReason::TakeProfit);
                }
            }
        }

        if pos.age_secs(now_secs) > self.trading.max_position_age_secs {
            return Some(ExitReason::Timeout);
        }

        None
    }

    /// Record an opened position
    pub fn open_position(&mut self, position: Position) {
        self.state.active_position = Some(position);
    }

    /// Book a close: realize P&L, update percentages, clear the position
    ///
    /// Daily P&L is measured against the portfolio value *before* this trade;
    /// total P&L against the fixed account baseline.
    pub fn apply_close(&mut self, close_price: f64, side: Side, qty: f64, entry_price: f64) {
        let pnl = match side {
            Side::Buy => (close_price - entry_price) * qty,
            Side::Sell => (entry_price - close_price) * qty,
        };

        let old_value = self.state.value_usdt;
        let new_value = old_value + pnl;
        self.state.value_usdt = new_value;
        self.state.total_pnl_pct = (new_value / self.risk.initial_portfolio_usdt - 1.0) * 100.0;
        self.state.daily_pnl_pct += pnl / old_value * 100.0;
        self.state.active_position = None;

        tracing::info!(
            pnl_usdt = pnl,
            portfolio = new_value,
            daily_pnl_pct = self.state.daily_pnl_pct,
            "Position closed"
        );
    }

    /// Record when the last position closed (starts the cooldown)
    pub fn set_last_close_time(&mut self, now_secs: f64) {
        self.state.last_close_time_secs = now_secs;
    }

    /// Whether the post-close cooldown has elapsed
    pub fn cooldown_elapsed(&self, now_secs: f64) -> bool {
        now_secs - self.state.last_close_time_secs >= self.trading.cooldown_secs
    }

    /// Record the latest signal, neutral or not
    pub fn set_last_signal(&mut self, signal: Signal) {
        self.state.last_signal = Some(signal);
    }

    /// Append an operational error to the bounded snapshot log
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.state.recent_errors.push_back(message.into());
        while self.state.recent_errors.len() > self.risk.max_recent_errors {
            self.state.recent_errors.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> RiskManager {
        RiskManager::new(
            TradingConfig::default(),
            RiskConfig::default(),
            dir.path().join("shared_state.json"),
        )
    }

    fn buy_position(entry: f64, open_time: f64) -> Position {
        Position {
            symbol: "BTCUSDT".to_string(),
            side: Side::Buy,
            quantity: 0.001,
            entry_price: entry,
            open_time_secs: open_time,
            order_id: 1,
        }
    }

    #[test]
    fn test_fresh_state_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&dir);
        assert_eq!(mgr.state().value_usdt, 1000.0);
        assert!(mgr.active_position().is_none());
    }

    #[test]
    fn test_can_open_blocked_by_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);
        assert!(mgr.can_open("BTCUSDT"));

        mgr.open_position(buy_position(100.0, 0.0));
        assert!(!mgr.can_open("BTCUSDT"));
    }

    #[test]
    fn test_can_open_blocked_by_daily_loss() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);

        // Default limit is 5%; book a loss past it
        mgr.state.daily_pnl_pct = -5.0;
        assert!(!mgr.can_open("BTCUSDT"));

        mgr.state.daily_pnl_pct = -4.9;
        assert!(mgr.can_open("BTCUSDT"));
    }

    #[test]
    fn test_position_size_meets_min_notional() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&dir);

        // 5% of 1000 = 50 USDT target; always >= 10 notional after rounding
        for price in [0.5, 3.0, 101.0, 30000.0, 42500.0, 250000.0] {
            let qty = mgr.position_size("BTCUSDT", price);
            assert!(
                qty * price >= MIN_NOTIONAL_USDT - 1e-9,
                "notional {} below floor at price {}",
                qty * price,
                price
            );
        }
    }

    #[test]
    fn test_position_size_rounds_to_step() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&dir);

        let qty = mgr.position_size("BTCUSDT", 42500.0);
        let scaled = qty * 1e5;
        assert!((scaled - scaled.round()).abs() < 1e-6);

        let qty = mgr.position_size("ETHUSDT", 2500.0);
        let scaled = qty * 1e4;
        assert!((scaled - scaled.round()).abs() < 1e-6);
    }

    #[test]
    fn test_position_size_small_portfolio_recomputes_from_min() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);
        mgr.state.value_usdt = 50.0;

        // 5% of 50 = 2.5 USDT target, under the 10 USDT exchange floor
        let qty = mgr.position_size("BTCUSDT", 30000.0);
        assert!(qty * 30000.0 >= MIN_NOTIONAL_USDT - 1e-9);
    }

    #[test]
    fn test_check_exit_stop_loss_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let mut trading = TradingConfig::default();
        trading.stop_loss_pct = 1.0;
        trading.take_profit_pct = 100.0; // out of the way
        let mut mgr = RiskManager::new(
            trading,
            RiskConfig::default(),
            dir.path().join("state.json"),
        );
        mgr.open_position(buy_position(100.0, 0.0));

        assert_eq!(mgr.check_exit(98.9, 1.0), Some(ExitReason::StopLoss));
        assert_eq!(mgr.check_exit(99.1, 1.0), None);
        assert_eq!(mgr.check_exit(99.0, 1.0), Some(ExitReason::StopLoss));
    }

    #[test]
    fn test_check_exit_take_profit_buy() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);
        mgr.open_position(buy_position(100.0, 0.0));

        // Default TP 0.8%
        assert_eq!(mgr.check_exit(100.81, 1.0), Some(ExitReason::TakeProfit));
        assert_eq!(mgr.check_exit(100.5, 1.0), None);
    }

    #[test]
    fn test_check_exit_sell_side_inverts() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);
        mgr.open_position(Position {
            side: Side::Sell,
            ..buy_position(100.0, 0.0)
        });

        // Default SL 0.5%, TP 0.8%
        assert_eq!(mgr.check_exit(100.51, 1.0), Some(ExitReason::StopLoss));
        assert_eq!(mgr.check_exit(99.19, 1.0), Some(ExitReason::TakeProfit));
        assert_eq!(mgr.check_exit(100.0, 1.0), None);
    }

    #[test]
    fn test_check_exit_timeout_only_without_price_trigger() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);
        mgr.open_position(buy_position(100.0, 0.0));

        // Default max age 30s: old position times out at an unremarkable price
        assert_eq!(mgr.check_exit(100.1, 31.0), Some(ExitReason::Timeout));
        // Price trigger wins even when the timeout would also fire
        assert_eq!(mgr.check_exit(99.0, 31.0), Some(ExitReason::StopLoss));
        // Young position, no trigger
        assert_eq!(mgr.check_exit(100.1, 29.0), None);
    }

    #[test]
    fn test_check_exit_flat_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(&dir);
        assert_eq!(mgr.check_exit(100.0, 1.0), None);
    }

    #[test]
    fn test_apply_close_buy_profit() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);
        mgr.open_position(buy_position(100.0, 0.0));

        mgr.apply_close(110.0, Side::Buy, 1.0, 100.0);

        assert_eq!(mgr.state().value_usdt, 1010.0);
        assert!((mgr.state().total_pnl_pct - 1.0).abs() < 1e-9);
        assert!((mgr.state().daily_pnl_pct - 1.0).abs() < 1e-9);
        assert!(mgr.active_position().is_none());
    }

    #[test]
    fn test_apply_close_sell_loss() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);

        mgr.apply_close(105.0, Side::Sell, 2.0, 100.0);

        // Short lost (100 - 105) * 2 = -10
        assert_eq!(mgr.state().value_usdt, 990.0);
        assert!((mgr.state().total_pnl_pct + 1.0).abs() < 1e-9);
        assert!((mgr.state().daily_pnl_pct + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_pnl_uses_pre_trade_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);

        mgr.apply_close(110.0, Side::Buy, 1.0, 100.0); // +10 on 1000 = +1.0%
        mgr.apply_close(110.0, Side::Buy, 1.0, 100.0); // +10 on 1010 = +0.990...%

        let expected = 1.0 + 10.0 / 1010.0 * 100.0;
        assert!((mgr.state().daily_pnl_pct - expected).abs() < 1e-9);
    }

    #[test]
    fn test_roll_daily_window_resets_on_new_day() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);
        mgr.state.daily_pnl_pct = -3.0;

        let day1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        mgr.roll_daily_window(day1);
        assert_eq!(mgr.state().daily_pnl_pct, -3.0); // first anchor, no reset

        mgr.roll_daily_window(day1);
        assert_eq!(mgr.state().daily_pnl_pct, -3.0); // same day

        mgr.roll_daily_window(day2);
        assert_eq!(mgr.state().daily_pnl_pct, 0.0);
        assert_eq!(mgr.state().daily_anchor_date, Some(day2));
    }

    #[test]
    fn test_cooldown() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);

        mgr.set_last_close_time(100.0);
        assert!(!mgr.cooldown_elapsed(101.0)); // 1s after close
        assert!(mgr.cooldown_elapsed(103.1)); // past the 3s default
    }

    #[test]
    fn test_record_error_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);

        for i in 0..20 {
            mgr.record_error(format!("error {i}"));
        }

        assert_eq!(mgr.state().recent_errors.len(), 8);
        assert_eq!(mgr.state().recent_errors.front().unwrap(), "error 12");
        assert_eq!(mgr.state().recent_errors.back().unwrap(), "error 19");
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = manager(&dir);

        mgr.apply_close(110.0, Side::Buy, 1.0, 100.0);
        mgr.persist().unwrap();

        let mgr2 = manager(&dir);
        assert_eq!(mgr2.state().value_usdt, 1010.0);
    }
}
