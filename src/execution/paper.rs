//! Paper trading execution engine

use super::types::{ExecutionError, Order, OrderFill};
use super::OrderExecutor;
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Paper execution engine with immediate simulated fills
///
/// Orders fill instantly at their reference price. Used in paper mode and by
/// the engine tests.
pub struct PaperExecutor {
    balance: f64,
    next_order_id: AtomicI64,
    fills: Arc<RwLock<Vec<(Order, OrderFill)>>>,
}

impl PaperExecutor {
    /// Create a paper executor reporting the given free balance
    pub fn new(balance: f64) -> Self {
        Self {
            balance,
            next_order_id: AtomicI64::new(1),
            fills: Arc::new(RwLock::new(vec![])),
        }
    }

    /// All simulated fills so far, in submission order
    pub async fn fills(&self) -> Vec<(Order, OrderFill)> {
        self.fills.read().await.clone()
    }
}

#[async_trait]
impl OrderExecutor for PaperExecutor {
    async fn place_market_order(&self, order: &Order) -> Result<OrderFill, ExecutionError> {
        let fill = OrderFill {
            order_id: self.next_order_id.fetch_add(1, Ordering::Relaxed),
            avg_price: Some(order.price),
        };

        self.fills.write().await.push((order.clone(), fill));

        tracing::info!(
            order_id = fill.order_id,
            symbol = %order.symbol,
            side = order.side.as_order_str(),
            qty = order.quantity,
            price = order.price,
            "Paper order filled"
        );
        Ok(fill)
    }

    async fn get_balance(&self, _asset: &str) -> Result<f64, ExecutionError> {
        Ok(self.balance)
    }

    async fn cancel_all_orders(&self, symbol: &str) -> Result<(), ExecutionError> {
        tracing::info!(symbol, "Paper cancel-all (no-op)");
        Ok(())
    }
}
