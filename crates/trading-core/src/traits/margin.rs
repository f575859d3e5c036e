//! Touch-margin trait definitions.

/// Derives the price unit ("pip") used to size touch margins.
///
/// The unit is computed once from the whole cleaned close series and then
/// held fixed for a run.
pub trait MarginModel: Send + Sync {
    /// Price unit for the given close series.
    fn pip_unit(&self, closes: &[f64]) -> f64;

    /// Get the name of the model.
    fn name(&self) -> &str;

    /// Touch margin for a number of pips.
    fn margin(&self, closes: &[f64], pips: f64) -> f64 {
        self.pip_unit(closes) * pips
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f64);

    impl MarginModel for Constant {
        fn pip_unit(&self, _closes: &[f64]) -> f64 {
            self.0
        }

        fn name(&self) -> &str {
            "constant"
        }
    }

    #[test]
    fn test_margin_scales_with_pips() {
        let model = Constant(0.01);
        assert!((model.margin(&[], 2.5) - 0.025).abs() < 1e-15);
    }
}
