//! Error types for the backtester.

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Strategy-specific errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Required column '{column}' not found (columns: {available})")]
    MissingColumn { column: String, available: String },

    #[error("Unparseable timestamp '{value}' at row {row}")]
    UnparseableTimestamp { row: usize, value: String },

    #[error("No data available")]
    NoDataAvailable,

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Indicator calculation errors.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for backtester operations.
pub type TradingResult<T> = Result<T, TradingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let err: StrategyError = IndicatorError::InvalidParameter("period".into()).into();
        let top: TradingError = err.into();
        assert!(top.to_string().contains("Invalid parameter: period"));
    }

    #[test]
    fn test_missing_column_message() {
        let err = DataError::MissingColumn {
            column: "close".into(),
            available: "time, open".into(),
        };
        assert_eq!(
            err.to_string(),
            "Required column 'close' not found (columns: time, open)"
        );
    }
}
