//! Market data module
//!
//! Streams 1s klines from Binance into bounded per-symbol history buffers

mod binance;
mod buffer;
mod types;

pub use binance::MarketDataFeed;
pub use buffer::HistoryBuffer;
pub use types::Bar;
