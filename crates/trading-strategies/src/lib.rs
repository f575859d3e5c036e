//! Strategy layer.
//!
//! This crate turns bars into per-bar indicator frames and evaluates the
//! moving-average touch rules on them:
//! - `MaTouchConfig` / `MaTouchStrategy`: the signal rules
//! - `build_frames`: Heikin-Ashi, MAs and Supertrend aligned per bar
//! - Touch margin models (`PriceGranularity`, `FixedPipUnit`)

mod frame;
mod ma_touch;
mod margin;

pub use frame::{build_frames, IndicatorFrame};
pub use ma_touch::{ArmedFlags, BarSignals, MaTouchConfig, MaTouchStrategy};
pub use margin::{FixedPipUnit, PriceGranularity};
pub use trading_indicators::MaType;
