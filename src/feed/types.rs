//! Market data types

use serde::{Deserialize, Serialize};

/// One 1-second OHLCV bar
///
/// Serialized with the compact single-letter keys the dashboard reads, the
/// same shape Binance uses inside its kline payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time in epoch milliseconds
    #[serde(rename = "t")]
    pub open_time_ms: i64,
    /// Open price
    #[serde(rename = "o")]
    pub open: f64,
    /// High price
    #[serde(rename = "h")]
    pub high: f64,
    /// Low price
    #[serde(rename = "l")]
    pub low: f64,
    /// Close price
    #[serde(rename = "c")]
    pub close: f64,
    /// Base asset volume
    #[serde(rename = "v")]
    pub volume: f64,
}
