//! CLI interface for microscalp
//!
//! Provides subcommands for:
//! - `run`: Start the trading engine
//! - `status`: Show the persisted portfolio snapshot
//! - `config`: Show the effective configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "microscalp")]
#[command(about = "Single-symbol 1s-kline scalping engine for Binance")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the trading engine
    Run(RunArgs),
    /// Show the persisted portfolio snapshot
    Status,
    /// Show the effective configuration
    Config,
}
