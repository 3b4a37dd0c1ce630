//! Stream configuration and event types

use std::time::Duration;
use thiserror::Error;

/// Configuration for a reconnecting market stream
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Reconnect backoff schedule
    pub backoff: Backoff,
    /// Interval for outbound ping frames
    pub ping_interval: Duration,
}

/// Exponential backoff schedule for reconnects
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    /// Delay before the first retry
    pub initial: Duration,
    /// Delay ceiling
    pub max: Duration,
    /// Retry budget; 0 retries forever
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(2),
            max: Duration::from_secs(60),
            // Liveness over fail-fast: a market stream outlives transient outages
            max_attempts: 0,
        }
    }
}

impl Backoff {
    /// The delay following `delay`, doubled and capped
    pub fn next_delay(&self, delay: Duration) -> Duration {
        (delay * 2).min(self.max)
    }

    /// Whether `attempt` exhausts the retry budget
    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts > 0 && attempt >= self.max_attempts
    }
}

impl WsConfig {
    /// Config for the given URL with default backoff and 30s pings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            backoff: Backoff::default(),
            ping_interval: Duration::from_secs(30),
        }
    }

    /// Set the reconnect backoff bounds
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff.initial = initial;
        self.backoff.max = max;
        self
    }

    /// Set the retry budget (0 = retry forever)
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.backoff.max_attempts = n;
        self
    }

    /// Set the outbound ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }
}

/// Events delivered to the stream consumer
///
/// Data frames and connection lifecycle share one channel so the consumer
/// sees them in order.
#[derive(Debug, Clone)]
pub enum WsEvent {
    /// Connection established (also after a successful reconnect)
    Open,
    /// Text frame
    Text(String),
    /// Binary frame
    Binary(Vec<u8>),
    /// Connection lost, retrying
    Retrying { attempt: u32 },
    /// Stream is over: clean close or retry budget exhausted
    Closed,
}

/// Stream transport errors
#[derive(Debug, Clone, Error)]
pub enum WsError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("retry budget exhausted")]
    RetriesExhausted,
}
