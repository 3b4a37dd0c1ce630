//! Binance 1s-kline WebSocket feed

use super::buffer::HistoryBuffer;
use super::types::Bar;
use crate::config::FeedConfig;
use crate::ws::{WsClient, WsConfig, WsEvent};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

/// Binance kline event envelope
#[derive(Debug, Deserialize)]
struct KlineEnvelope {
    /// Event type
    #[serde(rename = "e")]
    event_type: String,
    /// Kline payload
    #[serde(rename = "k")]
    kline: KlinePayload,
}

/// The kline object inside a stream event; prices arrive as strings
#[derive(Debug, Deserialize)]
struct KlinePayload {
    #[serde(rename = "t")]
    open_time_ms: i64,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "v")]
    volume: String,
}

/// Streams 1s klines for a set of symbols into bounded history buffers
///
/// One streaming task per symbol; each task owns the write side of its
/// symbol's buffer while the decision loop takes snapshot reads. Connection
/// drops are retried by the underlying [`WsClient`] with jittered backoff.
pub struct MarketDataFeed {
    symbols: Vec<String>,
    config: FeedConfig,
    buffers: Arc<RwLock<HashMap<String, HistoryBuffer>>>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl MarketDataFeed {
    /// Create a feed for the given symbols (not yet connected)
    pub fn new(symbols: Vec<String>, config: FeedConfig) -> Self {
        let symbols: Vec<String> = symbols.into_iter().map(|s| s.to_uppercase()).collect();
        let buffers = symbols
            .iter()
            .map(|s| (s.clone(), HistoryBuffer::new(config.buffer_capacity)))
            .collect();
        let (shutdown, _) = watch::channel(false);

        Self {
            symbols,
            config,
            buffers: Arc::new(RwLock::new(buffers)),
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Stream URL for one symbol's kline channel
    fn stream_url(&self, symbol: &str) -> String {
        format!(
            "{}/{}@kline_{}",
            self.config.ws_url,
            symbol.to_lowercase(),
            self.config.interval
        )
    }

    /// Start one streaming task per symbol
    pub fn start(&mut self) {
        for symbol in self.symbols.clone() {
            let url = self.stream_url(&symbol);
            let ws_config = WsConfig::new(url)
                .backoff(
                    Duration::from_secs(self.config.reconnect_initial_secs),
                    Duration::from_secs(self.config.reconnect_max_secs),
                )
                .max_attempts(self.config.max_reconnect_attempts);
            let buffers = self.buffers.clone();
            let shutdown = self.shutdown.subscribe();

            self.tasks.push(tokio::spawn(async move {
                Self::run_symbol_stream(symbol, ws_config, buffers, shutdown).await;
            }));
        }
    }

    /// Signal all streaming tasks to stop and wait for them to finish
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Feed task ended abnormally");
            }
        }
    }

    /// Newest bar for a symbol, or none
    pub async fn latest(&self, symbol: &str) -> Option<Bar> {
        let buffers = self.buffers.read().await;
        buffers
            .get(&symbol.to_uppercase())
            .and_then(|b| b.latest().copied())
    }

    /// Last `n` bars for a symbol, oldest first (fewer if unavailable)
    pub async fn window(&self, symbol: &str, n: usize) -> Vec<Bar> {
        let buffers = self.buffers.read().await;
        buffers
            .get(&symbol.to_uppercase())
            .map(|b| b.window(n))
            .unwrap_or_default()
    }

    /// Append a bar to a symbol's buffer
    ///
    /// Used by the streaming tasks; also the injection point for tests and
    /// replays.
    pub async fn push_bar(&self, symbol: &str, bar: Bar) {
        let mut buffers = self.buffers.write().await;
        if let Some(buffer) = buffers.get_mut(&symbol.to_uppercase()) {
            buffer.push(bar);
        }
    }

    /// Parse a kline stream event into a Bar
    fn parse_message(msg: &str) -> Option<Bar> {
        let envelope: KlineEnvelope = serde_json::from_str(msg).ok()?;

        if envelope.event_type != "kline" {
            return None;
        }

        let k = envelope.kline;
        Some(Bar {
            open_time_ms: k.open_time_ms,
            open: k.open.parse().ok()?,
            high: k.high.parse().ok()?,
            low: k.low.parse().ok()?,
            close: k.close.parse().ok()?,
            volume: k.volume.parse().ok()?,
        })
    }

    /// One symbol's stream loop: receive, parse, append
    async fn run_symbol_stream(
        symbol: String,
        ws_config: WsConfig,
        buffers: Arc<RwLock<HashMap<String, HistoryBuffer>>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let client = WsClient::new(ws_config);
        let mut rx = client.connect();

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!(symbol = %symbol, "Stopping kline stream");
                    break;
                }
                event = rx.recv() => match event {
                    Some(WsEvent::Text(text)) => {
                        match Self::parse_message(&text) {
                            Some(bar) => {
                                let mut buffers = buffers.write().await;
                                if let Some(buffer) = buffers.get_mut(&symbol) {
                                    buffer.push(bar);
                                }
                            }
                            None => {
                                tracing::warn!(symbol = %symbol, "Dropping malformed kline message");
                            }
                        }
                    }
                    Some(WsEvent::Open) => {
                        tracing::info!(symbol = %symbol, "Kline stream connected");
                    }
                    Some(WsEvent::Retrying { attempt }) => {
                        tracing::warn!(symbol = %symbol, attempt, "Kline stream reconnecting...");
                    }
                    Some(WsEvent::Binary(_)) => {
                        // Binance kline streams are text-only
                    }
                    Some(WsEvent::Closed) | None => {
                        tracing::error!(symbol = %symbol, "Kline stream terminated");
                        break;
                    }
                }
            }
        }
    }
}
