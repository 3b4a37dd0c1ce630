//! microscalp: single-symbol 1s-kline scalping engine for Binance
//!
//! A WebSocket kline feed fills a bounded history buffer; every second the
//! engine extracts short-horizon features, asks a pluggable classifier for a
//! direction, runs the risk gates, and places at most one market order.
//! Portfolio and kline snapshots are persisted as JSON for an external
//! dashboard.

pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod execution;
pub mod features;
pub mod feed;
pub mod risk;
pub mod signal;
pub mod telemetry;
pub mod ws;
