//! Risk management types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an open position must close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Timeout,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Risk state persistence errors
#[derive(Debug, Error)]
pub enum RiskError {
    /// Snapshot file I/O failed
    #[error("state file error: {0}")]
    Io(#[from] std::io::Error),
    /// Snapshot (de)serialization failed
    #[error("state serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_reason_display() {
        assert_eq!(ExitReason::StopLoss.to_string(), "stop_loss");
        assert_eq!(ExitReason::TakeProfit.to_string(), "take_profit");
        assert_eq!(ExitReason::Timeout.to_string(), "timeout");
    }
}
