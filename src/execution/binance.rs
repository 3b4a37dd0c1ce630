//! Binance testnet REST order client

use super::types::{ExecutionError, Order, OrderFill, SymbolFilters};
use super::OrderExecutor;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signed request window in milliseconds
const RECV_WINDOW_MS: u64 = 5000;

/// Order placement response (spot, FULL response type)
#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(rename = "orderId")]
    order_id: i64,
    #[serde(rename = "avgPrice", default)]
    avg_price: Option<String>,
    #[serde(default)]
    fills: Vec<FillLine>,
}

#[derive(Debug, Deserialize)]
struct FillLine {
    price: String,
    qty: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    balances: Vec<BalanceLine>,
}

#[derive(Debug, Deserialize)]
struct BalanceLine {
    asset: String,
    free: String,
}

/// Places market orders against the Binance (testnet) REST API
///
/// Requests are HMAC-SHA256 signed. Quantities go over the wire as
/// fixed-precision decimal strings matching the symbol's step size; anything
/// else risks `-1013 LOT_SIZE` rejections.
pub struct BinanceExecutor {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
    api_secret: String,
}

impl BinanceExecutor {
    /// Create an executor for the given REST endpoint and credentials
    pub fn new(
        rest_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            rest_url: rest_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// HMAC-SHA256 signature over the query string, hex encoded
    fn sign(secret: &str, query: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Build a signed query string from parameters
    fn signed_query(&self, params: &[(&str, String)]) -> String {
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let signature = Self::sign(&self.api_secret, &query);
        format!("{}&signature={}", query, signature)
    }

    fn timestamp_ms() -> u64 {
        chrono::Utc::now().timestamp_millis() as u64
    }

    /// Average price from the response: explicit field first, else the
    /// quantity-weighted mean of the fill lines
    fn average_price(response: &OrderResponse) -> Option<f64> {
        if let Some(avg) = response.avg_price.as_deref().and_then(|s| s.parse().ok()) {
            return Some(avg);
        }

        let mut notional = 0.0;
        let mut qty_sum = 0.0;
        for fill in &response.fills {
            let price: f64 = fill.price.parse().ok()?;
            let qty: f64 = fill.qty.parse().ok()?;
            notional += price * qty;
            qty_sum += qty;
        }
        if qty_sum > 0.0 {
            Some(notional / qty_sum)
        } else {
            None
        }
    }
}

#[async_trait]
impl OrderExecutor for BinanceExecutor {
    async fn place_market_order(&self, order: &Order) -> Result<OrderFill, ExecutionError> {
        let filters = SymbolFilters::for_symbol(&order.symbol);
        let qty_str = filters.format_qty(order.quantity);
        let symbol = order.symbol.to_uppercase();

        tracing::info!(
            symbol = %symbol,
            side = order.side.as_order_str(),
            qty = %qty_str,
            "Placing market order"
        );

        // A fresh client order id makes retries idempotent on the venue side
        let client_order_id = format!("ms-{}", uuid::Uuid::new_v4().simple());
        let params = [
            ("symbol", symbol.clone()),
            ("side", order.side.as_order_str().to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", qty_str),
            ("newClientOrderId", client_order_id),
            ("timestamp", Self::timestamp_ms().to_string()),
            ("recvWindow", RECV_WINDOW_MS.to_string()),
        ];
        let url = format!("{}/api/v3/order?{}", self.rest_url, self.signed_query(&params));

        let response = self
            .http
            .post(url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::Rejected(format!("{status}: {body}")));
        }

        let parsed: OrderResponse = response
            .json()
            .await
            .map_err(|e| ExecutionError::InvalidResponse(e.to_string()))?;

        let avg_price = Self::average_price(&parsed);
        tracing::info!(
            order_id = parsed.order_id,
            avg_price = ?avg_price,
            "Order filled"
        );

        Ok(OrderFill {
            order_id: parsed.order_id,
            avg_price,
        })
    }

    async fn get_balance(&self, asset: &str) -> Result<f64, ExecutionError> {
        let params = [
            ("timestamp", Self::timestamp_ms().to_string()),
            ("recvWindow", RECV_WINDOW_MS.to_string()),
        ];
        let url = format!(
            "{}/api/v3/account?{}",
            self.rest_url,
            self.signed_query(&params)
        );

        let response = self
            .http
            .get(url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::Rejected(format!("{status}: {body}")));
        }

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| ExecutionError::InvalidResponse(e.to_string()))?;

        account
            .balances
            .iter()
            .find(|b| b.asset == asset)
            .and_then(|b| b.free.parse().ok())
            .ok_or_else(|| ExecutionError::InvalidResponse(format!("no balance for {asset}")))
    }

    async fn cancel_all_orders(&self, symbol: &str) -> Result<(), ExecutionError> {
        let params = [
            ("symbol", symbol.to_uppercase()),
            ("timestamp", Self::timestamp_ms().to_string()),
            ("recvWindow", RECV_WINDOW_MS.to_string()),
        ];
        let url = format!(
            "{}/api/v3/openOrders?{}",
            self.rest_url,
            self.signed_query(&params)
        );

        let response = self
            .http
            .delete(url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::Rejected(format!("{status}: {body}")));
        }

        tracing::info!(symbol, "Cancelled all open orders");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_known_vector() {
        // From the Binance API signed-endpoint documentation example
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            BinanceExecutor::sign(secret, query),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signed_query_appends_signature() {
        let exec = BinanceExecutor::new("https://testnet.binance.vision", "key", "secret");
        let q = exec.signed_query(&[("symbol", "BTCUSDT".to_string())]);
        assert!(q.starts_with("symbol=BTCUSDT&signature="));
    }

    #[test]
    fn test_average_price_prefers_explicit_field() {
        let response = OrderResponse {
            order_id: 1,
            avg_price: Some("42500.5".to_string()),
            fills: vec![FillLine {
                price: "1.0".to_string(),
                qty: "1.0".to_string(),
            }],
        };
        assert_eq!(BinanceExecutor::average_price(&response), Some(42500.5));
    }

    #[test]
    fn test_average_price_weighted_from_fills() {
        let response = OrderResponse {
            order_id: 1,
            avg_price: None,
            fills: vec![
                FillLine {
                    price: "100.0".to_string(),
                    qty: "1.0".to_string(),
                },
                FillLine {
                    price: "102.0".to_string(),
                    qty: "3.0".to_string(),
                },
            ],
        };
        let avg = BinanceExecutor::average_price(&response).unwrap();
        assert!((avg - 101.5).abs() < 1e-12);
    }

    #[test]
    fn test_average_price_absent() {
        let response = OrderResponse {
            order_id: 1,
            avg_price: None,
            fills: vec![],
        };
        assert_eq!(BinanceExecutor::average_price(&response), None);
    }

    #[test]
    fn test_order_response_parse() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "orderId": 28,
            "transactTime": 1507725176595,
            "status": "FILLED",
            "fills": [
                {"price": "4000.00000000", "qty": "1.00000000", "commission": "4.0", "commissionAsset": "USDT"}
            ]
        }"#;
        let parsed: OrderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.order_id, 28);
        assert_eq!(parsed.fills.len(), 1);
        assert_eq!(BinanceExecutor::average_price(&parsed), Some(4000.0));
    }
}
