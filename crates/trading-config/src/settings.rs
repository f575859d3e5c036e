//! Configuration structures.

use serde::{Deserialize, Serialize};
use trading_backtest::{BacktestConfig, ParamGrid, DEFAULT_MAX_DRAWDOWN};
use trading_core::types::Timeframe;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub sweep: SweepSettings,
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "ha-touch".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Bar CSV used when the command line names none
    pub bars: Option<String>,
    /// Target timeframe when resampling ticks
    pub timeframe: Timeframe,
    /// IANA zone that resampled bars are bucketed and written in
    pub tz: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            bars: None,
            timeframe: Timeframe::Hour1,
            tz: "UTC".to_string(),
        }
    }
}

/// Parameter sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    pub grid: ParamGrid,
    /// Drawdown ceiling of the "safe" ranking, in currency units
    pub max_drawdown: f64,
    /// Rows printed per ranking
    pub top: usize,
    pub parallel: bool,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            grid: ParamGrid::default(),
            max_drawdown: DEFAULT_MAX_DRAWDOWN,
            top: 5,
            parallel: true,
        }
    }
}
