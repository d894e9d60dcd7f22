//! Backtest runner: wires together data loading, prediction, engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: resolves data from a `BacktestConfig`, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded bars and predictions. No I/O.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use predlab_core::data::{align, AlignedSeries};
use predlab_core::domain::{Bar, Prediction};
use predlab_core::engine::{
    clamp_confidences, replay, run_backtest, BacktestResult, EngineConfig, EngineError,
};
use predlab_core::predictor::{PredictionSource, SmaRsiPredictor};
use predlab_core::rng::{SeedStreams, BARS_STREAM, PREDICTOR_STREAM};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_bars, load_predictions_csv, DataSource, LoadError};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Where a run's predictions came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionOrigin {
    File {
        path: PathBuf,
    },
    Heuristic {
        fast_sma: usize,
        slow_sma: usize,
        rsi_period: usize,
    },
}

/// Bars and predictions resolved from a config, aligned and ready to replay.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub series: AlignedSeries,
    pub source: DataSource,
    pub predictions: PredictionOrigin,
    pub duplicates_dropped: usize,
}

/// Complete outcome of a single backtest run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub metrics: PerformanceMetrics,
    pub result: BacktestResult,
    pub source: DataSource,
    pub predictions: PredictionOrigin,
    pub duplicates_dropped: usize,
}

/// Run a single backtest from a BacktestConfig.
///
/// This is the high-level entry point used by the CLI.
pub fn run_single_backtest(config: &BacktestConfig) -> Result<RunReport, RunError> {
    let prepared = prepare_data(config)?;
    let engine = config.engine_config();
    let result = replay(&prepared.series, &engine)?;
    let metrics = PerformanceMetrics::compute(&result);

    Ok(RunReport {
        run_id: config.run_id(),
        metrics,
        result,
        source: prepared.source,
        predictions: prepared.predictions,
        duplicates_dropped: prepared.duplicates_dropped,
    })
}

/// Run a backtest with pre-loaded data: no I/O.
pub fn run_backtest_from_data(
    bars: Vec<Bar>,
    predictions: Vec<Prediction>,
    engine: &EngineConfig,
) -> Result<(BacktestResult, PerformanceMetrics), RunError> {
    let result = run_backtest(bars, predictions, engine)?;
    let metrics = PerformanceMetrics::compute(&result);
    Ok((result, metrics))
}

/// Load bars, obtain predictions, clamp, and align.
///
/// Predictions come from `data.predictions_path` when set, otherwise from the
/// SMA/RSI heuristic seeded from the config seed.
pub fn prepare_data(config: &BacktestConfig) -> Result<PreparedData, RunError> {
    config.validate()?;
    let engine = config.engine_config();
    let streams = SeedStreams::new(config.data.seed);

    let loaded = load_bars(&config.data, &mut streams.rng_for(BARS_STREAM))?;
    let mut bars = loaded.bars;

    let (mut predictions, origin) = match &config.data.predictions_path {
        Some(path) => (
            load_predictions_csv(path)?,
            PredictionOrigin::File { path: path.clone() },
        ),
        None => {
            let p = &config.predictor;
            let mut predictor = SmaRsiPredictor::new(
                p.fast_sma,
                p.slow_sma,
                p.rsi_period,
                streams.rng_for(PREDICTOR_STREAM),
            )
            .with_band(engine.confidence_band);
            predictor.prepare(&mut bars);
            (
                predictor.predict(&bars),
                PredictionOrigin::Heuristic {
                    fast_sma: p.fast_sma,
                    slow_sma: p.slow_sma,
                    rsi_period: p.rsi_period,
                },
            )
        }
    };

    // A row cap on the bars file applies to the prediction file too.
    if config.data.max_rows.is_some() && predictions.len() > bars.len() {
        tracing::warn!(
            predictions = predictions.len(),
            bars = bars.len(),
            "truncating predictions to the capped bar count"
        );
        predictions.truncate(bars.len());
    }

    let predictions = clamp_confidences(predictions, &engine);
    let series = align(bars, predictions).map_err(EngineError::from)?;

    Ok(PreparedData {
        series,
        source: loaded.source,
        predictions: origin,
        duplicates_dropped: loaded.duplicates_dropped,
    })
}
