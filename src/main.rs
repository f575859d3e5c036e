//! Heikin-Ashi MA-touch backtester CLI.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use trading_config::load_or_default;
use trading_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Command-line flags win over the config's logging section
    let logging = load_or_default(&cli.config)
        .map(|c| c.logging)
        .unwrap_or_default();
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or(logging.level.clone());
    setup_logging(&level, cli.json_logs || logging.is_json());

    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, &cli.config).await,
        Commands::Sweep(args) => cli::commands::sweep::run(args, &cli.config).await,
        Commands::Resample(args) => cli::commands::resample::run(args, &cli.config).await,
        Commands::Aggregate(args) => cli::commands::aggregate::run(args, &cli.config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
    }
}
