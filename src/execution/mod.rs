//! Order execution module
//!
//! Market order placement against the exchange (live) or simulated (paper)

mod binance;
mod paper;
mod types;

pub use binance::BinanceExecutor;
pub use paper::PaperExecutor;
pub use types::{ExecutionError, Order, OrderFill, SymbolFilters};

use async_trait::async_trait;

/// Trait for order execution implementations
///
/// Failures are values, never panics: the engine maps any error to "order
/// not filled" and leaves position state untouched.
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// Place a market order; returns the fill on success
    async fn place_market_order(&self, order: &Order) -> Result<OrderFill, ExecutionError>;
    /// Free balance for an asset (best effort)
    async fn get_balance(&self, asset: &str) -> Result<f64, ExecutionError>;
    /// Cancel all open orders for a symbol (best effort)
    async fn cancel_all_orders(&self, symbol: &str) -> Result<(), ExecutionError>;
}
