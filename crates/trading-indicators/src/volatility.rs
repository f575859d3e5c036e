//! Volatility indicators.

use serde::{Deserialize, Serialize};
use trading_core::error::IndicatorError;
use trading_core::traits::{BarIndicator, Indicator};
use trading_core::types::Bar;

use crate::moving_average::exponential_smoothing;

/// True range per bar.
///
/// The first bar has no previous close, so its true range is its own
/// high-low range.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrueRange;

impl BarIndicator for TrueRange {
    type Output = f64;

    fn calculate_bars(&self, bars: &[Bar]) -> Vec<f64> {
        let mut prev_close = None;
        bars.iter()
            .map(|bar| {
                let tr = bar.true_range(prev_close);
                prev_close = Some(bar.close);
                tr
            })
            .collect()
    }

    fn period(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "TR"
    }
}

/// Wilder's smoothed moving average (RMA).
///
/// An exponential average with weight 1 / period, seeded with the first
/// value.
#[derive(Debug, Clone)]
pub struct Rma {
    period: usize,
}

impl Rma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "Period must be greater than 0".into(),
            ));
        }
        Ok(Self { period })
    }

    /// Smoothed values, one per input.
    pub fn smooth(&self, data: &[f64]) -> Vec<f64> {
        exponential_smoothing(data, 1.0 / self.period as f64)
    }
}

impl Indicator for Rma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        self.smooth(data).into_iter().map(Some).collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "RMA"
    }
}

/// Average True Range (ATR).
///
/// RMA of the true range. Defined from the first bar, trustworthy once
/// `period` bars have fed the recursion.
#[derive(Debug, Clone)]
pub struct Atr {
    rma: Rma,
}

impl Atr {
    /// Create a new ATR indicator.
    ///
    /// Common period is 14.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        Ok(Self {
            rma: Rma::new(period)?,
        })
    }

    /// Smooth an already computed true-range series.
    pub fn from_true_range(&self, true_range: &[f64]) -> Vec<f64> {
        self.rma.smooth(true_range)
    }
}

impl BarIndicator for Atr {
    type Output = f64;

    fn calculate_bars(&self, bars: &[Bar]) -> Vec<f64> {
        self.from_true_range(&TrueRange.calculate_bars(bars))
    }

    fn period(&self) -> usize {
        self.rma.period
    }

    fn name(&self) -> &str {
        "ATR"
    }
}

/// Supertrend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendDirection {
    /// Price above the trailing lower band
    Up,
    /// Price below the trailing upper band
    Down,
}

impl TrendDirection {
    /// Conventional sign: -1 while tracking the lower band, +1 while
    /// tracking the upper band.
    pub fn sign(&self) -> i8 {
        match self {
            TrendDirection::Up => -1,
            TrendDirection::Down => 1,
        }
    }

    pub fn is_up(&self) -> bool {
        *self == TrendDirection::Up
    }

    pub fn is_down(&self) -> bool {
        *self == TrendDirection::Down
    }
}

/// One Supertrend output point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupertrendPoint {
    /// Active band: lower band in an uptrend, upper band in a downtrend
    pub value: f64,
    pub direction: TrendDirection,
    /// Clamped upper band
    pub upper: f64,
    /// Clamped lower band
    pub lower: f64,
}

/// Supertrend.
///
/// ATR bands around the bar midpoint that only tighten while the trend
/// holds. Each step reads the previous *clamped* bands, so the bands and the
/// direction are computed as one ordered fold.
#[derive(Debug, Clone)]
pub struct Supertrend {
    atr: Atr,
    factor: f64,
}

impl Supertrend {
    /// Create a Supertrend with the given ATR period and band factor.
    pub fn new(period: usize, factor: f64) -> Result<Self, IndicatorError> {
        if !(factor > 0.0) || !factor.is_finite() {
            return Err(IndicatorError::InvalidParameter(format!(
                "Supertrend factor must be positive, got {}",
                factor
            )));
        }
        Ok(Self {
            atr: Atr::new(period)?,
            factor,
        })
    }

    /// Classic parameters (10, 3.0).
    pub fn default_params() -> Self {
        Self {
            atr: Atr {
                rma: Rma { period: 10 },
            },
            factor: 3.0,
        }
    }

    pub fn atr(&self) -> &Atr {
        &self.atr
    }

    /// Run the fold over bars with a precomputed ATR series.
    ///
    /// `atr` must have one entry per bar.
    pub fn fold(&self, bars: &[Bar], atr: &[f64]) -> Vec<SupertrendPoint> {
        let mut result: Vec<SupertrendPoint> = Vec::with_capacity(bars.len());

        for (i, (bar, &atr)) in bars.iter().zip(atr).enumerate() {
            let mid = bar.midpoint();
            let raw_upper = mid + self.factor * atr;
            let raw_lower = mid - self.factor * atr;

            let point = match result.last() {
                None => SupertrendPoint {
                    value: raw_lower,
                    direction: TrendDirection::Up,
                    upper: raw_upper,
                    lower: raw_lower,
                },
                Some(prev) => {
                    let prev_close = bars[i - 1].close;

                    let upper = if raw_upper < prev.upper || prev_close > prev.upper {
                        raw_upper
                    } else {
                        prev.upper
                    };
                    let lower = if raw_lower > prev.lower || prev_close < prev.lower {
                        raw_lower
                    } else {
                        prev.lower
                    };

                    let direction = match prev.direction {
                        TrendDirection::Up if bar.close >= lower => TrendDirection::Up,
                        TrendDirection::Up => TrendDirection::Down,
                        TrendDirection::Down if bar.close <= upper => TrendDirection::Down,
                        TrendDirection::Down => TrendDirection::Up,
                    };

                    let value = match direction {
                        TrendDirection::Up => lower,
                        TrendDirection::Down => upper,
                    };

                    SupertrendPoint {
                        value,
                        direction,
                        upper,
                        lower,
                    }
                }
            };
            result.push(point);
        }

        result
    }
}

impl BarIndicator for Supertrend {
    type Output = SupertrendPoint;

    fn calculate_bars(&self, bars: &[Bar]) -> Vec<SupertrendPoint> {
        let atr = self.atr.calculate_bars(bars);
        self.fold(bars, &atr)
    }

    fn period(&self) -> usize {
        self.atr.period()
    }

    fn name(&self) -> &str {
        "Supertrend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: i64, o: f64, h: f64, l: f64, c: f64) -> Bar {
        Bar::new(i * 60_000, o, h, l, c, 0.0)
    }

    fn fixture() -> Vec<Bar> {
        vec![
            bar(0, 10.0, 11.0, 9.0, 10.0),
            bar(1, 10.0, 11.0, 9.0, 10.5),
            bar(2, 10.0, 10.0, 4.0, 5.0),
            bar(3, 5.0, 6.0, 4.0, 5.5),
            bar(4, 6.0, 12.0, 6.0, 11.0),
        ]
    }

    #[test]
    fn test_true_range() {
        let tr = TrueRange.calculate_bars(&fixture());
        assert_eq!(tr, vec![2.0, 2.0, 6.5, 2.0, 6.5]);
    }

    #[test]
    fn test_rma_wilder_smoothing() {
        let rma = Rma::new(2).unwrap();
        let result = rma.smooth(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(result, vec![1.0, 1.5, 2.25, 3.125]);
    }

    #[test]
    fn test_atr_period_one_equals_true_range() {
        let bars = fixture();
        let atr = Atr::new(1).unwrap().calculate_bars(&bars);
        assert_eq!(atr, TrueRange.calculate_bars(&bars));
    }

    #[test]
    fn test_atr_smooths_from_first_bar() {
        let atr = Atr::new(2).unwrap().calculate_bars(&fixture());
        // 2, 2, 2 + 0.5*(6.5-2) = 4.25, 4.25 + 0.5*(2-4.25) = 3.125
        assert!((atr[2] - 4.25).abs() < 1e-12);
        assert!((atr[3] - 3.125).abs() < 1e-12);
    }

    #[test]
    fn test_supertrend_hand_computed() {
        let st = Supertrend::new(1, 1.0).unwrap();
        let points = st.calculate_bars(&fixture());

        let directions: Vec<TrendDirection> = points.iter().map(|p| p.direction).collect();
        assert_eq!(
            directions,
            vec![
                TrendDirection::Up,
                TrendDirection::Up,
                TrendDirection::Down,
                TrendDirection::Down,
                TrendDirection::Up,
            ]
        );

        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![8.0, 8.0, 12.0, 7.0, 3.0]);

        // Bar 2: raw upper 13.5 is looser than the previous 12, so it is held.
        assert_eq!(points[2].upper, 12.0);
        // Bar 3: previous close 5 broke below lower band 8, so the raw lower is taken.
        assert_eq!(points[3].lower, 3.0);
    }

    #[test]
    fn test_supertrend_direction_sign() {
        assert_eq!(TrendDirection::Up.sign(), -1);
        assert_eq!(TrendDirection::Down.sign(), 1);
    }

    #[test]
    fn test_supertrend_deterministic() {
        let bars: Vec<Bar> = (0..200)
            .map(|i| {
                let p = 100.0 + (i as f64 * 0.21).sin() * 7.0;
                bar(i, p, p + 1.3, p - 1.1, p + 0.4)
            })
            .collect();
        let st = Supertrend::default_params();
        assert_eq!(st.calculate_bars(&bars), st.calculate_bars(&bars));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Supertrend::new(0, 3.0).is_err());
        assert!(Supertrend::new(10, 0.0).is_err());
        assert!(Supertrend::new(10, f64::NAN).is_err());
        assert!(Rma::new(0).is_err());
    }
}
