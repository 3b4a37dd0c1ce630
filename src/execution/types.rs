//! Execution types

use crate::signal::Side;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// A market order to be submitted
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Trading symbol
    pub symbol: String,
    /// Trade side
    pub side: Side,
    /// Base asset quantity
    pub quantity: f64,
    /// Reference price at submission time; paper fills execute here
    pub price: f64,
}

/// A completed fill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderFill {
    /// Exchange order id
    pub order_id: i64,
    /// Average fill price when the venue reports one
    pub avg_price: Option<f64>,
}

/// Execution errors
///
/// Every API-level failure surfaces as a value; the engine treats any of
/// these as "order not filled" and re-evaluates next tick.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Venue rejected the order
    #[error("order rejected: {0}")]
    Rejected(String),
    /// Transport-level failure
    #[error("transport error: {0}")]
    Transport(String),
    /// Response did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// API credentials are missing
    #[error("missing credentials: {0}")]
    MissingCredentials(String),
}

/// Per-asset quantity constraints
///
/// Binance rejects orders that violate the step size, so quantities are
/// rounded to the symbol's precision and clamped to its minimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolFilters {
    /// Minimum tradeable quantity
    pub min_qty: f64,
    /// Decimal places of the quantity step
    pub precision: u32,
}

impl SymbolFilters {
    /// Filters for a symbol (BTC: 5 dp, ETH: 4 dp, default: 5 dp)
    pub fn for_symbol(symbol: &str) -> Self {
        let symbol = symbol.to_uppercase();
        if symbol.contains("ETH") {
            Self {
                min_qty: 0.0001,
                precision: 4,
            }
        } else {
            // BTC and everything else
            Self {
                min_qty: 0.00001,
                precision: 5,
            }
        }
    }

    /// Round a quantity to this symbol's precision
    pub fn round_qty(&self, qty: f64) -> f64 {
        let factor = 10f64.powi(self.precision as i32);
        (qty * factor).round() / factor
    }

    /// Round a quantity up to this symbol's precision
    pub fn ceil_qty(&self, qty: f64) -> f64 {
        let factor = 10f64.powi(self.precision as i32);
        (qty * factor).ceil() / factor
    }

    /// Quantity as a fixed-precision decimal string, never scientific notation
    pub fn format_qty(&self, qty: f64) -> String {
        let d = Decimal::from_f64(qty)
            .unwrap_or_default()
            .round_dp_with_strategy(self.precision, RoundingStrategy::MidpointNearestEven);
        format!("{:.*}", self.precision as usize, d)
    }
}
