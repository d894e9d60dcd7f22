//! Relative Strength Index (RSI), simple-average form.
//!
//! Average gain and average loss are plain rolling means of the last `period`
//! close-to-close changes (no Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → 100; both zero → 50.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    /// A zero period is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        // changes[i] is close[i] - close[i-1]; NaN if either side is missing.
        let changes: Vec<f64> = std::iter::once(f64::NAN)
            .chain(bars.windows(2).map(|w| match (w[0].close_price(), w[1].close_price()) {
                (Some(prev), Some(curr)) => curr - prev,
                _ => f64::NAN,
            }))
            .collect();

        for i in self.period..n {
            let window = &changes[i + 1 - self.period..=i];
            if window.iter().any(|c| c.is_nan()) {
                continue;
            }
            let gain: f64 = window.iter().filter(|&&c| c > 0.0).sum();
            let loss: f64 = window.iter().filter(|&&c| c < 0.0).map(|c| -c).sum();
            let p = self.period as f64;
            result[i] = rsi_from_averages(gain / p, loss / p);
        }

        result
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
