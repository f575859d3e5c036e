//! Indicator trait definitions.

use crate::types::Bar;

/// Trait for technical indicators computed from a single price series.
///
/// Output is aligned with the input: one entry per data point, `None`
/// while the indicator is still warming up.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Values for `data`, one per input point.
    fn calculate(&self, data: &[f64]) -> Vec<Option<Self::Output>>;

    /// Index + 1 of the first defined value.
    fn period(&self) -> usize;

    fn name(&self) -> &str;
}

/// Indicator that uses whole bars (not just close).
///
/// These are sequential folds over the bar sequence; the output has one
/// entry per bar.
pub trait BarIndicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values from bars, in order.
    fn calculate_bars(&self, bars: &[Bar]) -> Vec<Self::Output>;

    /// Get the number of bars the recursion needs before it is trustworthy.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}
