//! Run command implementation

use crate::config::{Config, ExecutionMode};
use crate::engine::TradingEngine;
use crate::execution::{BinanceExecutor, OrderExecutor, PaperExecutor};
use crate::feed::MarketDataFeed;
use crate::signal::load_model;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Force paper execution regardless of the configured mode
    #[arg(long)]
    pub paper: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let feed = MarketDataFeed::new(config.trading.symbols.clone(), config.feed.clone());
        let model = load_model(&config.model.path);
        let executor = self.build_executor(config)?;

        let mut engine = TradingEngine::new(config, feed, model, executor)?;
        engine.run().await
    }

    /// Executor for the configured mode; live mode requires credentials
    fn build_executor(&self, config: &Config) -> anyhow::Result<Arc<dyn OrderExecutor>> {
        let mode = if self.paper {
            ExecutionMode::Paper
        } else {
            config.execution.mode
        };

        match mode {
            ExecutionMode::Paper => {
                tracing::info!("Paper execution mode");
                Ok(Arc::new(PaperExecutor::new(
                    config.risk.initial_portfolio_usdt,
                )))
            }
            ExecutionMode::Live => {
                let key = std::env::var(&config.execution.api_key_env).map_err(|_| {
                    anyhow::anyhow!("live mode requires {}", config.execution.api_key_env)
                })?;
                let secret = std::env::var(&config.execution.api_secret_env).map_err(|_| {
                    anyhow::anyhow!("live mode requires {}", config.execution.api_secret_env)
                })?;
                tracing::info!(rest_url = %config.execution.rest_url, "Live execution mode");
                Ok(Arc::new(BinanceExecutor::new(
                    config.execution.rest_url.clone(),
                    key,
                    secret,
                )))
            }
        }
    }
}
