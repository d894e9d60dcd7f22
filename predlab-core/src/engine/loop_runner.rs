//! Single-pass replay: the heart of the backtest engine.
//!
//! One pass over `i = 0..N-2`. Each step is handed to the pure decision rule;
//! accepted entries are settled into the run's ledger.

use crate::data::{align, AlignedSeries};
use crate::domain::{Bar, Prediction};

use super::decision::{decide, Decision};
use super::state::{BacktestResult, EngineConfig, EngineError, RunParameters, RunState};

/// Run a backtest over bars and their aligned predictions.
///
/// Confidences are clamped into `config.confidence_band` before alignment.
pub fn run_backtest(
    bars: Vec<Bar>,
    predictions: Vec<Prediction>,
    config: &EngineConfig,
) -> Result<BacktestResult, EngineError> {
    config.validate()?;
    let predictions = clamp_confidences(predictions, config);
    let series = align(bars, predictions)?;
    replay(&series, config)
}

/// Clamp every prediction's confidence into the configured band.
pub fn clamp_confidences(predictions: Vec<Prediction>, config: &EngineConfig) -> Vec<Prediction> {
    predictions
        .into_iter()
        .map(|p| Prediction::new(p.direction, config.confidence_band.clamp(p.confidence)))
        .collect()
}

/// Replay an already aligned series.
///
/// The series is read-only, so many replays (e.g. a threshold sweep) can share
/// one. Predictions are used as given; clamping is the caller's job.
pub fn replay(series: &AlignedSeries, config: &EngineConfig) -> Result<BacktestResult, EngineError> {
    config.validate()?;

    let mut state = RunState::new(config.initial_balance, series.len());

    for step in series.steps() {
        match decide(&step, config.min_confidence) {
            Decision::Skip(reason) => {
                tracing::trace!(index = step.index, ?reason, "step skipped");
                state.record_skip(reason);
            }
            Decision::Enter(entry) => {
                let trade = state.settle(&step, &entry, &config.payoff, config.stake);
                tracing::debug!(
                    index = trade.index,
                    direction = %trade.direction,
                    actual = %trade.actual_direction,
                    result = trade.outcome.as_str(),
                    profit = trade.profit,
                    balance = trade.balance,
                    "trade settled"
                );
            }
        }
    }

    let result = state.finish(RunParameters::from(config));
    let diag = result.diagnostics();
    tracing::info!(
        bars = diag.bars,
        trades = result.trades().len(),
        skipped_low_confidence = diag.skipped_low_confidence,
        skipped_missing_close = diag.skipped_missing_close,
        final_balance = result.final_balance(),
        "backtest complete"
    );
    Ok(result)
}
