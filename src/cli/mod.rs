//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use trading_strategies::MaType;

#[derive(Parser)]
#[command(name = "ha-touch")]
#[command(author, version, about = "Heikin-Ashi moving-average touch backtester")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "HA_TOUCH_CONFIG")]
    pub config: PathBuf,

    /// Log level (overrides the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one backtest over a bar CSV
    Backtest(BacktestArgs),
    /// Run a parameter sweep and rank the results
    Sweep(SweepArgs),
    /// Resample tick files into OHLC bars
    Resample(ResampleArgs),
    /// Summarize a saved trade log
    Aggregate(AggregateArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MaTypeArg {
    Sma,
    Ema,
}

impl From<MaTypeArg> for MaType {
    fn from(arg: MaTypeArg) -> Self {
        match arg {
            MaTypeArg::Sma => MaType::SimpleMovingAverage,
            MaTypeArg::Ema => MaType::ExponentialMovingAverage,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Bar CSV (defaults to `data.bars` from the config)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// First bar to include (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub start: Option<String>,

    /// Last bar to include (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub end: Option<String>,

    /// Moving average type
    #[arg(long)]
    pub ma_type: Option<MaTypeArg>,

    /// Initial capital
    #[arg(long)]
    pub capital: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Write the trade log as CSV
    #[arg(long)]
    pub trades_out: Option<PathBuf>,

    /// Save the full report as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct SweepArgs {
    /// Bar CSV (defaults to `data.bars` from the config)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Drawdown ceiling for the safe ranking
    #[arg(long)]
    pub max_drawdown: Option<f64>,

    /// Rows per ranking
    #[arg(long)]
    pub top: Option<usize>,

    /// Write every result as CSV
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Run configurations one at a time
    #[arg(long)]
    pub sequential: bool,
}

#[derive(clap::Args)]
pub struct ResampleArgs {
    /// Directory of tick files, or a single tick file
    #[arg(short, long)]
    pub input_dir: PathBuf,

    /// Output bar CSV
    #[arg(short, long)]
    pub output: PathBuf,

    /// Target timeframe (1m, 5m, 15m, 30m, 1h, 4h, 1d)
    #[arg(short, long)]
    pub timeframe: Option<String>,

    /// IANA time zone for bar boundaries and output timestamps (e.g. Asia/Tokyo)
    #[arg(long)]
    pub tz: Option<String>,
}

#[derive(clap::Args)]
pub struct AggregateArgs {
    /// Trade log CSV
    #[arg(long)]
    pub trades: PathBuf,

    /// Initial capital the log started from
    #[arg(long)]
    pub capital: Option<f64>,
}
