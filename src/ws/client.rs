//! Reconnecting WebSocket stream

use super::types::{WsConfig, WsError, WsEvent};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// How one connected session ended
enum SessionEnd {
    /// Server closed cleanly or the consumer went away
    Clean,
    /// Transport failure; the supervisor should retry
    Failed(WsError),
}

/// A supervised WebSocket stream that reconnects with jittered backoff
///
/// Read-only by design: market streams never need to write anything but
/// pongs. The consumer gets data frames and lifecycle events over one
/// channel; a final [`WsEvent::Closed`] means the stream is over for good.
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// The configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Spawn the supervisor task and return the event receiver
    pub fn connect(&self) -> mpsc::Receiver<WsEvent> {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::supervise(config, tx).await {
                tracing::error!(error = %e, "Stream supervisor gave up");
            }
        });

        rx
    }

    /// Delay plus up to 25% jitter, so parallel streams don't reconnect in
    /// lockstep after a shared outage
    fn jittered(delay: Duration) -> Duration {
        let base_ms = delay.as_millis() as u64;
        let jitter_ms = rand::thread_rng().gen_range(0..=base_ms / 4);
        Duration::from_millis(base_ms + jitter_ms)
    }

    /// Connect, stream, and reconnect until clean close or budget exhaustion
    async fn supervise(config: WsConfig, tx: mpsc::Sender<WsEvent>) -> Result<(), WsError> {
        let mut attempt = 0u32;
        let mut delay = config.backoff.initial;

        loop {
            let end = match Self::open(&config).await {
                Ok((sink, source)) => {
                    // A usable connection resets the backoff schedule
                    attempt = 0;
                    delay = config.backoff.initial;

                    if tx.send(WsEvent::Open).await.is_err() {
                        return Ok(());
                    }
                    Self::pump(&config, sink, source, &tx).await
                }
                Err(e) => SessionEnd::Failed(e),
            };

            match end {
                SessionEnd::Clean => {
                    let _ = tx.send(WsEvent::Closed).await;
                    return Ok(());
                }
                SessionEnd::Failed(e) => {
                    attempt += 1;
                    tracing::warn!(url = %config.url, error = %e, attempt, "Stream dropped");

                    if config.backoff.exhausted(attempt) {
                        let _ = tx.send(WsEvent::Closed).await;
                        return Err(WsError::RetriesExhausted);
                    }
                    if tx.is_closed() {
                        return Ok(());
                    }
                    let _ = tx.send(WsEvent::Retrying { attempt }).await;

                    tokio::time::sleep(Self::jittered(delay)).await;
                    delay = config.backoff.next_delay(delay);
                }
            }
        }
    }

    /// Dial the endpoint and split the stream
    async fn open(config: &WsConfig) -> Result<(WsSink, WsSource), WsError> {
        tracing::info!(url = %config.url, "Connecting");
        let (stream, _response) = connect_async(&config.url)
            .await
            .map_err(|e| WsError::Connect(e.to_string()))?;
        Ok(stream.split())
    }

    /// Forward frames to the consumer until the session ends
    async fn pump(
        config: &WsConfig,
        mut sink: WsSink,
        mut source: WsSource,
        tx: &mpsc::Sender<WsEvent>,
    ) -> SessionEnd {
        let mut ping_timer = tokio::time::interval(config.ping_interval);
        ping_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick fires immediately; skip it so the ping cadence starts
        // one interval after connect
        ping_timer.tick().await;
        let mut awaiting_pong = false;

        loop {
            tokio::select! {
                frame = source.next() => {
                    let event = match frame {
                        Some(Ok(Message::Text(text))) => WsEvent::Text(text),
                        Some(Ok(Message::Binary(data))) => WsEvent::Binary(data),
                        Some(Ok(Message::Ping(payload))) => {
                            if let Err(e) = sink.send(Message::Pong(payload)).await {
                                return SessionEnd::Failed(WsError::Send(e.to_string()));
                            }
                            continue;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            awaiting_pong = false;
                            continue;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!(url = %config.url, "Server closed the stream");
                            return SessionEnd::Clean;
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            return SessionEnd::Failed(WsError::Connect(e.to_string()));
                        }
                        None => {
                            return SessionEnd::Failed(WsError::Connect("stream ended".into()));
                        }
                    };

                    if tx.send(event).await.is_err() {
                        // Consumer is gone; nothing left to do
                        return SessionEnd::Clean;
                    }
                }

                _ = ping_timer.tick() => {
                    if awaiting_pong {
                        return SessionEnd::Failed(WsError::Connect("pong timeout".into()));
                    }
                    if let Err(e) = sink.send(Message::Ping(Vec::new())).await {
                        return SessionEnd::Failed(WsError::Send(e.to_string()));
                    }
                    awaiting_pong = true;
                }
            }
        }
    }
}
