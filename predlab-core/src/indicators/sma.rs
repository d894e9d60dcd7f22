//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a window. A window containing a missing
//! close is undefined. First valid value at index period-1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// A zero period is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        // Running sum over finite closes plus a count of missing ones in the window.
        let mut sum = 0.0;
        let mut missing = 0usize;
        for (i, bar) in bars.iter().enumerate() {
            match bar.close_price() {
                Some(c) => sum += c,
                None => missing += 1,
            }
            if i >= self.period {
                match bars[i - self.period].close_price() {
                    Some(c) => sum -= c,
                    None => missing -= 1,
                }
            }
            if i + 1 >= self.period && missing == 0 {
                result[i] = sum / self.period as f64;
            }
        }

        result
    }
}
