//! Moving average indicators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trading_core::error::IndicatorError;
use trading_core::traits::Indicator;

fn check_period(period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "Period must be greater than 0".into(),
        ));
    }
    Ok(())
}

/// Recursive smoothing `y[i] = y[i-1] + alpha * (x[i] - y[i-1])`, seeded
/// with the first value. Shared by EMA and Wilder's RMA.
pub(crate) fn exponential_smoothing(data: &[f64], alpha: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    let mut iter = data.iter();
    if let Some(&first) = iter.next() {
        let mut value = first;
        result.push(value);
        for &x in iter {
            value += alpha * (x - value);
            result.push(value);
        }
    }
    result
}

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values. Undefined until
/// the window fills.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period(period)?;
        Ok(Self { period })
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        if data.len() < self.period {
            return result;
        }

        let period_f64 = self.period as f64;

        // Initial sum
        let mut sum: f64 = data[..self.period].iter().sum();
        result[self.period - 1] = Some(sum / period_f64);

        // Sliding window
        for i in self.period..data.len() {
            sum = sum - data[i - self.period] + data[i];
            result[i] = Some(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA).
///
/// Smoothing factor 2 / (period + 1), seeded with the first value, so it is
/// defined from the first bar on.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period(period)?;
        let multiplier = 2.0 / (period as f64 + 1.0);
        Ok(Self { period, multiplier })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        exponential_smoothing(data, self.multiplier)
            .into_iter()
            .map(Some)
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

/// Moving average flavour selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaType {
    #[default]
    #[serde(rename = "SMA", alias = "sma")]
    SimpleMovingAverage,
    #[serde(rename = "EMA", alias = "ema")]
    ExponentialMovingAverage,
}

impl fmt::Display for MaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaType::SimpleMovingAverage => write!(f, "SMA"),
            MaType::ExponentialMovingAverage => write!(f, "EMA"),
        }
    }
}

impl FromStr for MaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMA" | "SIMPLE" => Ok(MaType::SimpleMovingAverage),
            "EMA" | "EXPONENTIAL" => Ok(MaType::ExponentialMovingAverage),
            _ => Err(format!("Invalid MA type: {}", s)),
        }
    }
}

/// A configured moving average of either flavour.
#[derive(Debug, Clone)]
pub enum MovingAverage {
    Simple(Sma),
    Exponential(Ema),
}

impl MovingAverage {
    pub fn new(kind: MaType, period: usize) -> Result<Self, IndicatorError> {
        Ok(match kind {
            MaType::SimpleMovingAverage => MovingAverage::Simple(Sma::new(period)?),
            MaType::ExponentialMovingAverage => MovingAverage::Exponential(Ema::new(period)?),
        })
    }
}

impl Indicator for MovingAverage {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        match self {
            MovingAverage::Simple(sma) => sma.calculate(data),
            MovingAverage::Exponential(ema) => ema.calculate(data),
        }
    }

    fn period(&self) -> usize {
        match self {
            MovingAverage::Simple(sma) => sma.period(),
            MovingAverage::Exponential(ema) => ema.period(),
        }
    }

    fn name(&self) -> &str {
        match self {
            MovingAverage::Simple(sma) => sma.name(),
            MovingAverage::Exponential(ema) => ema.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let sma = Sma::new(3).unwrap();
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma.calculate(&data);

        assert_eq!(result.len(), 5);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert!((result[2].unwrap() - 2.0).abs() < 1e-10); // (1+2+3)/3
        assert!((result[3].unwrap() - 3.0).abs() < 1e-10); // (2+3+4)/3
        assert!((result[4].unwrap() - 4.0).abs() < 1e-10); // (3+4+5)/3
    }

    #[test]
    fn test_sma_insufficient_data() {
        let sma = Sma::new(5).unwrap();
        let data = vec![1.0, 2.0, 3.0];
        let result = sma.calculate(&data);

        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(Sma::new(0).is_err());
        assert!(Ema::new(0).is_err());
    }

    #[test]
    fn test_ema_seeded_with_first_value() {
        let ema = Ema::new(3).unwrap();
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema.calculate(&data);

        // mult = 2/(3+1) = 0.5
        assert_eq!(result.len(), 5);
        assert_eq!(result[0], Some(1.0));
        assert!((result[1].unwrap() - 1.5).abs() < 1e-12);
        assert!((result[2].unwrap() - 2.25).abs() < 1e-12);
        assert!((result[3].unwrap() - 3.125).abs() < 1e-12);
    }

    #[test]
    fn test_moving_average_dispatch() {
        let data = vec![2.0, 4.0, 6.0];
        let sma = MovingAverage::new(MaType::SimpleMovingAverage, 2).unwrap();
        let ema = MovingAverage::new(MaType::ExponentialMovingAverage, 2).unwrap();

        assert_eq!(sma.calculate(&data), vec![None, Some(3.0), Some(5.0)]);
        assert_eq!(ema.calculate(&data)[0], Some(2.0));
        assert_eq!(sma.name(), "SMA");
        assert_eq!(ema.name(), "EMA");
    }

    #[test]
    fn test_ma_type_parse() {
        assert_eq!("sma".parse::<MaType>().unwrap(), MaType::SimpleMovingAverage);
        assert_eq!("EMA".parse::<MaType>().unwrap(), MaType::ExponentialMovingAverage);
        assert!("WMA".parse::<MaType>().is_err());
        assert_eq!(MaType::default().to_string(), "SMA");
    }
}
