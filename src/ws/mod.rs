//! WebSocket stream module
//!
//! Supervised, reconnecting market stream with jittered backoff

mod client;
mod types;

pub use client::WsClient;
pub use types::{Backoff, WsConfig, WsError, WsEvent};
