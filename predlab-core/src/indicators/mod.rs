//! Technical indicators used by the heuristic predictor.
//!
//! Indicators are pure functions: bar history in, numeric series out. They
//! are computed once over the whole series and written onto each bar's
//! indicator map. A warm-up value is NaN, which `Bar::indicator` treats as
//! undefined.

pub mod rsi;
pub mod sma;

pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;

/// Trait for indicators.
///
/// `compute` returns a series the same length as `bars`. No value at bar t
/// may depend on bars after t.
pub trait Indicator: Send + Sync {
    /// Name the value is stored under (e.g. "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Compute each indicator and attach it to the bars.
///
/// A value already present on a bar (e.g. read from the input file) is kept.
pub fn enrich(bars: &mut [Bar], indicators: &[&dyn Indicator]) {
    for indicator in indicators {
        let values = indicator.compute(bars);
        let name = indicator.name();
        for (bar, value) in bars.iter_mut().zip(values) {
            if bar.indicator(name).is_none() {
                bar.set_indicator(name, value);
            }
        }
    }
}

/// Synthetic hourly bars from close prices, for tests.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar::from_close(base + chrono::Duration::hours(i as i64), close))
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
