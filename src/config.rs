//! Configuration types for microscalp

use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Trading parameters
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Symbols to stream; the engine trades the first one
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Position size as a percentage of portfolio value
    #[serde(default = "default_position_size_pct")]
    pub position_size_pct: f64,

    /// Stop-loss distance from entry, percent
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,

    /// Take-profit distance from entry, percent
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: f64,

    /// Maximum holding time before a timeout exit, seconds
    #[serde(default = "default_max_position_age_secs")]
    pub max_position_age_secs: f64,

    /// Minimum delay after a close before the next entry, seconds
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f64,

    /// Confidence required to act on a signal
    #[serde(default = "default_strong_signal_confidence")]
    pub strong_signal_confidence: f64,
}

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string()]
}
fn default_position_size_pct() -> f64 {
    5.0
}
fn default_stop_loss_pct() -> f64 {
    0.5
}
fn default_take_profit_pct() -> f64 {
    0.8
}
fn default_max_position_age_secs() -> f64 {
    30.0
}
fn default_cooldown_secs() -> f64 {
    3.0
}
fn default_strong_signal_confidence() -> f64 {
    0.7
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            position_size_pct: default_position_size_pct(),
            stop_loss_pct: default_stop_loss_pct(),
            take_profit_pct: default_take_profit_pct(),
            max_position_age_secs: default_max_position_age_secs(),
            cooldown_secs: default_cooldown_secs(),
            strong_signal_confidence: default_strong_signal_confidence(),
        }
    }
}

/// Risk limits
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Daily loss limit, percent; entries stop once breached
    #[serde(default = "default_daily_loss_limit_pct")]
    pub daily_loss_limit_pct: f64,

    /// Account baseline used for total P&L percentage
    #[serde(default = "default_initial_portfolio_usdt")]
    pub initial_portfolio_usdt: f64,

    /// How many operational errors the snapshot retains
    #[serde(default = "default_max_recent_errors")]
    pub max_recent_errors: usize,
}

fn default_daily_loss_limit_pct() -> f64 {
    5.0
}
fn default_initial_portfolio_usdt() -> f64 {
    1000.0
}
fn default_max_recent_errors() -> usize {
    8
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            daily_loss_limit_pct: default_daily_loss_limit_pct(),
            initial_portfolio_usdt: default_initial_portfolio_usdt(),
            max_recent_errors: default_max_recent_errors(),
        }
    }
}

/// Classifier artifact location
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: String,
}

fn default_model_path() -> String {
    "models/scalping_model.json".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

/// Market data feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// WebSocket base URL
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Kline interval channel
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Bars retained per symbol
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Initial reconnect delay, seconds
    #[serde(default = "default_reconnect_initial_secs")]
    pub reconnect_initial_secs: u64,

    /// Reconnect delay cap, seconds
    #[serde(default = "default_reconnect_max_secs")]
    pub reconnect_max_secs: u64,

    /// Reconnect attempt budget (0 = retry forever)
    #[serde(default)]
    pub max_reconnect_attempts: u32,
}

fn default_ws_url() -> String {
    "wss://stream.binance.com:9443/ws".to_string()
}
fn default_interval() -> String {
    "1s".to_string()
}
fn default_buffer_capacity() -> usize {
    60
}
fn default_reconnect_initial_secs() -> u64 {
    2
}
fn default_reconnect_max_secs() -> u64 {
    60
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            interval: default_interval(),
            buffer_capacity: default_buffer_capacity(),
            reconnect_initial_secs: default_reconnect_initial_secs(),
            reconnect_max_secs: default_reconnect_max_secs(),
            max_reconnect_attempts: 0,
        }
    }
}

/// Order execution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Paper or live order routing
    #[serde(default)]
    pub mode: ExecutionMode,

    /// REST base URL for live orders
    #[serde(default = "default_rest_url")]
    pub rest_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Environment variable holding the API secret
    #[serde(default = "default_api_secret_env")]
    pub api_secret_env: String,
}

/// Execution mode: paper trading or live
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Paper,
    Live,
}

fn default_rest_url() -> String {
    "https://testnet.binance.vision".to_string()
}
fn default_api_key_env() -> String {
    "BINANCE_API_KEY".to_string()
}
fn default_api_secret_env() -> String {
    "BINANCE_API_SECRET".to_string()
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Paper,
            rest_url: default_rest_url(),
            api_key_env: default_api_key_env(),
            api_secret_env: default_api_secret_env(),
        }
    }
}

/// Decision loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Decision cadence, seconds
    #[serde(default = "default_tick_secs")]
    pub tick_secs: f64,

    /// Persisted portfolio snapshot path
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Dashboard window snapshot path
    #[serde(default = "default_klines_file")]
    pub klines_file: PathBuf,
}

fn default_tick_secs() -> f64 {
    1.0
}
fn default_state_file() -> PathBuf {
    PathBuf::from("shared_state.json")
}
fn default_klines_file() -> PathBuf {
    PathBuf::from("latest_klines.json")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            state_file: default_state_file(),
            klines_file: default_klines_file(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// The symbol the engine trades (first configured symbol)
    pub fn primary_symbol(&self) -> anyhow::Result<String> {
        self.trading
            .symbols
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no symbols configured"))
    }
}
