//! Risk management module
//!
//! Portfolio state, position gating, sizing, and exit rules

mod manager;
mod state;
mod types;

pub use manager::{RiskManager, MIN_NOTIONAL_USDT};
pub use state::{PortfolioState, Position};
pub use types::{ExitReason, RiskError};
