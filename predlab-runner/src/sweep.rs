//! Confidence-threshold sweep.
//!
//! Every threshold replays the same read-only aligned series. Runs share
//! nothing mutable, so they execute in parallel with rayon. Results keep the
//! order of the input thresholds.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use predlab_core::data::AlignedSeries;
use predlab_core::engine::{replay, EngineConfig, EngineError};

use crate::metrics::PerformanceMetrics;

/// Thresholds used when none are given: 0.50, 0.55, ..., 0.90.
pub fn default_thresholds() -> Vec<f64> {
    (0..=8).map(|i| 0.5 + i as f64 * 0.05).collect()
}

/// One row of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub min_confidence: f64,
    pub metrics: PerformanceMetrics,
}

/// Sweep executor over one engine configuration.
#[derive(Debug, Clone)]
pub struct ThresholdSweep {
    base: EngineConfig,
    parallel: bool,
}

impl ThresholdSweep {
    pub fn new(base: EngineConfig) -> Self {
        Self {
            base,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run one backtest per threshold.
    ///
    /// Fails on the first invalid threshold; no partial results are returned.
    pub fn run(
        &self,
        series: &AlignedSeries,
        thresholds: &[f64],
    ) -> Result<SweepResults, EngineError> {
        let run_one = |&t: &f64| -> Result<SweepPoint, EngineError> {
            let config = self.base.with_min_confidence(t);
            let result = replay(series, &config)?;
            Ok(SweepPoint {
                min_confidence: t,
                metrics: PerformanceMetrics::compute(&result),
            })
        };

        tracing::info!(
            runs = thresholds.len(),
            parallel = self.parallel,
            "starting threshold sweep"
        );
        let points = if self.parallel {
            thresholds
                .par_iter()
                .map(run_one)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            thresholds
                .iter()
                .map(run_one)
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults { points })
    }
}

/// Ordered sweep output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    points: Vec<SweepPoint>,
}

impl SweepResults {
    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highest total profit. Ties go to the earlier threshold.
    pub fn best(&self) -> Option<&SweepPoint> {
        self.points.iter().fold(None, |best, p| match best {
            Some(b) if b.metrics.total_profit >= p.metrics.total_profit => Some(b),
            _ => Some(p),
        })
    }
}
