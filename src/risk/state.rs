//! Persisted portfolio state

use super::types::RiskError;
use crate::signal::{Side, Signal};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// An open market exposure; at most one exists at any time
///
/// Field names follow the shared-state schema the dashboard reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Trading symbol
    pub symbol: String,
    /// Held side
    pub side: Side,
    /// Base asset quantity
    pub quantity: f64,
    /// Filled average entry price
    pub entry_price: f64,
    /// Entry time in epoch seconds
    #[serde(rename = "open_time")]
    pub open_time_secs: f64,
    /// Exchange order id of the opening fill
    pub order_id: i64,
}

impl Position {
    /// Position age at `now` (epoch seconds)
    pub fn age_secs(&self, now: f64) -> f64 {
        now - self.open_time_secs
    }
}

/// The single persisted snapshot shared with the dashboard
///
/// The engine is the sole writer; the dashboard process reads the same file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Portfolio value in quote currency
    #[serde(rename = "portfolio_value_usdt")]
    pub value_usdt: f64,
    /// Total P&L versus the account baseline, percent
    pub total_pnl_pct: f64,
    /// Today's realized P&L, percent
    pub daily_pnl_pct: f64,
    /// The open position, if any
    pub active_position: Option<Position>,
    /// Most recent signal, neutral or not
    #[serde(default)]
    pub last_signal: Option<Signal>,
    /// When the last position closed, epoch seconds
    #[serde(rename = "last_close_time", default)]
    pub last_close_time_secs: f64,
    /// Bounded log of recent operational errors
    #[serde(default)]
    pub recent_errors: VecDeque<String>,
    /// UTC date the daily P&L counter was last reset on
    #[serde(default)]
    pub daily_anchor_date: Option<NaiveDate>,
}

impl PortfolioState {
    /// Fresh state with the given starting portfolio value
    pub fn with_value(value_usdt: f64) -> Self {
        Self {
            value_usdt,
            total_pnl_pct: 0.0,
            daily_pnl_pct: 0.0,
            active_position: None,
            last_signal: None,
            last_close_time_secs: 0.0,
            recent_errors: VecDeque::new(),
            daily_anchor_date: None,
        }
    }

    /// Load a snapshot from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RiskError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the snapshot atomically (temp file + rename)
    ///
    /// The rename keeps the dashboard from ever reading a half-written file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RiskError> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
