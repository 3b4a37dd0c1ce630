use clap::Parser;
use microscalp::cli::{Cli, Commands};
use microscalp::config::Config;
use microscalp::risk::PortfolioState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; a present-but-broken file is fatal, a missing one
    // falls back to the bundled example defaults
    let config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", cli.config, e))?
    } else {
        eprintln!("No config at {}, using default configuration", cli.config);
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    };

    // Initialize telemetry
    microscalp::telemetry::init(&config.telemetry.log_level);

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting trading engine");
            args.execute(&config).await?;
        }
        Commands::Status => match PortfolioState::load(&config.engine.state_file) {
            Ok(state) => {
                println!("microscalp status");
                println!("  Portfolio: {:.2} USDT", state.value_usdt);
                println!("  Total P&L: {:.2}%", state.total_pnl_pct);
                println!("  Daily P&L: {:.2}%", state.daily_pnl_pct);
                match &state.active_position {
                    Some(pos) => println!(
                        "  Position: {} {} {} @ {}",
                        pos.side.as_order_str(),
                        pos.quantity,
                        pos.symbol,
                        pos.entry_price
                    ),
                    None => println!("  Position: none"),
                }
            }
            Err(_) => {
                println!("microscalp status");
                println!("  No state snapshot at {}", config.engine.state_file.display());
            }
        },
        Commands::Config => {
            println!("Current configuration:");
            println!("  Symbols: {}", config.trading.symbols.join(", "));
            println!(
                "  Feed: {} @ {}",
                config.feed.ws_url, config.feed.interval
            );
            println!("  Execution: {:?}", config.execution.mode);
            println!(
                "  Risk: size={}%, SL={}%, TP={}%, daily limit={}%",
                config.trading.position_size_pct,
                config.trading.stop_loss_pct,
                config.trading.take_profit_pct,
                config.risk.daily_loss_limit_pct
            );
            println!("  Model: {}", config.model.path);
        }
    }

    Ok(())
}
