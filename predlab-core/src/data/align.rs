//! Bar/prediction alignment.
//!
//! Predictions are paired with bars by position. The aligned series hands the
//! engine one step at a time: the decision bar, the bar after it, and the
//! prediction made at the decision bar. A step never exposes anything past
//! `index + 1`.

use crate::domain::{Bar, Prediction};
use thiserror::Error;

/// Input-shape violations. Fatal: no step is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error("backtest needs at least 2 bars, got {0}")]
    TooFewBars(usize),

    #[error("{bars} bars but {predictions} predictions (expected {bars} or {})", .bars - 1)]
    LengthMismatch { bars: usize, predictions: usize },
}

/// Bars and predictions of compatible length, owned for one run.
#[derive(Debug, Clone)]
pub struct AlignedSeries {
    bars: Vec<Bar>,
    predictions: Vec<Prediction>,
}

/// One replay step: the decision at `index`, settled on the next bar.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub index: usize,
    pub bar: &'a Bar,
    pub next: &'a Bar,
    pub prediction: &'a Prediction,
}

/// Pair bars with predictions by position.
///
/// `predictions` may have length N or N - 1: the final bar has no successor,
/// so its prediction can never be evaluated and may be omitted.
pub fn align(bars: Vec<Bar>, predictions: Vec<Prediction>) -> Result<AlignedSeries, AlignError> {
    let n = bars.len();
    if n < 2 {
        return Err(AlignError::TooFewBars(n));
    }
    if predictions.len() != n && predictions.len() != n - 1 {
        return Err(AlignError::LengthMismatch {
            bars: n,
            predictions: predictions.len(),
        });
    }
    Ok(AlignedSeries { bars, predictions })
}

impl AlignedSeries {
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    /// Number of bars.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; alignment rejects short series.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Number of evaluable steps (N - 1).
    pub fn step_count(&self) -> usize {
        self.bars.len() - 1
    }

    /// Steps in chronological order.
    pub fn steps(&self) -> impl Iterator<Item = Step<'_>> + '_ {
        self.bars
            .windows(2)
            .zip(self.predictions.iter())
            .enumerate()
            .map(|(index, (pair, prediction))| Step {
                index,
                bar: &pair[0],
                next: &pair[1],
                prediction,
            })
    }
}
