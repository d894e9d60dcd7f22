//! Heuristic prediction source.
//!
//! Stands in for a trained model when no prediction file is supplied: a
//! moving-average crossover picks the direction and RSI scales confidence.
//! Each prediction reads only the bar it is made at.

use crate::domain::{Bar, Direction, Prediction};
use crate::engine::ConfidenceBand;
use crate::indicators::{enrich, Indicator, Rsi, Sma};
use rand::rngs::StdRng;
use rand::Rng;

/// Column name used by processed data files that carry an unnamed RSI.
const PLAIN_RSI: &str = "rsi";
const NEUTRAL_RSI: f64 = 50.0;

/// Anything that can produce one prediction per bar.
pub trait PredictionSource {
    fn predict(&mut self, bars: &[Bar]) -> Vec<Prediction>;
}

/// SMA-crossover / RSI heuristic.
///
/// - `sma_fast > sma_slow` → UP, confidence `0.6 + (rsi - 50) / 100 * 0.3`
/// - otherwise → DOWN, confidence `0.6 + (50 - rsi) / 100 * 0.3`
/// - either SMA undefined → random direction, confidence uniform in [0.5, 0.8)
///
/// Missing RSI counts as 50. Confidence is clamped into the band.
#[derive(Debug)]
pub struct SmaRsiPredictor {
    fast: Sma,
    slow: Sma,
    rsi: Rsi,
    band: ConfidenceBand,
    rng: StdRng,
}

impl SmaRsiPredictor {
    pub fn new(fast: usize, slow: usize, rsi_period: usize, rng: StdRng) -> Self {
        Self {
            fast: Sma::new(fast),
            slow: Sma::new(slow),
            rsi: Rsi::new(rsi_period),
            band: ConfidenceBand::default(),
            rng,
        }
    }

    pub fn with_band(mut self, band: ConfidenceBand) -> Self {
        self.band = band;
        self
    }

    /// Attach the indicators this predictor reads to `bars`.
    pub fn prepare(&self, bars: &mut [Bar]) {
        enrich(bars, &[&self.fast, &self.slow, &self.rsi]);
    }

    fn predict_bar(&mut self, bar: &Bar) -> Prediction {
        let fast = bar.indicator(self.fast.name());
        let slow = bar.indicator(self.slow.name());
        let rsi = bar
            .indicator(self.rsi.name())
            .or_else(|| bar.indicator(PLAIN_RSI))
            .unwrap_or(NEUTRAL_RSI);

        let (direction, confidence) = match (fast, slow) {
            (Some(f), Some(s)) if f > s => (Direction::Up, 0.6 + (rsi - 50.0) / 100.0 * 0.3),
            (Some(_), Some(_)) => (Direction::Down, 0.6 + (50.0 - rsi) / 100.0 * 0.3),
            _ => {
                let direction = if self.rng.gen::<f64>() > 0.5 {
                    Direction::Up
                } else {
                    Direction::Down
                };
                (direction, 0.5 + self.rng.gen::<f64>() * 0.3)
            }
        };

        Prediction::new(direction, self.band.clamp(confidence))
    }
}

impl PredictionSource for SmaRsiPredictor {
    /// Bars must already carry the indicators (see [`SmaRsiPredictor::prepare`]).
    fn predict(&mut self, bars: &[Bar]) -> Vec<Prediction> {
        bars.iter().map(|bar| self.predict_bar(bar)).collect()
    }
}
