//! Kline snapshot persistence

use crate::feed::Bar;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Number of trailing bars kept in the snapshot file
pub const SNAPSHOT_BARS: usize = 100;

/// Snapshot persistence errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Trailing window of recent bars, written each tick for external consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KlineSnapshot {
    /// Trading symbol the bars belong to
    pub symbol: String,
    /// Most recent bars, oldest first
    pub klines: Vec<Bar>,
    /// Unix time of the write, seconds
    pub updated_at: f64,
}

impl KlineSnapshot {
    /// Build a snapshot from a bar window, keeping the trailing
    /// [`SNAPSHOT_BARS`] entries
    pub fn new(symbol: impl Into<String>, bars: &[Bar], updated_at: f64) -> Self {
        let start = bars.len().saturating_sub(SNAPSHOT_BARS);
        Self {
            symbol: symbol.into(),
            klines: bars[start..].to_vec(),
            updated_at,
        }
    }

    /// Write the snapshot atomically (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Read a snapshot back
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}
