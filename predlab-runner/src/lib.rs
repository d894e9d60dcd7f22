//! PredLab Runner: backtest orchestration, metrics, sweeps and export.
//!
//! This crate builds on `predlab-core` to provide:
//! - TOML run configuration with content-addressed run ids
//! - Bar and prediction loading from CSV, with a synthetic fallback
//! - Single-backtest runner producing metrics alongside the ledger
//! - Parallel confidence-threshold sweeps
//! - Results file, CSV and Markdown artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{load_bars, DataSource, LoadError, LoadedData};
pub use export::{load_results, save_artifacts, ResultsFile};
pub use metrics::PerformanceMetrics;
pub use runner::{
    prepare_data, run_backtest_from_data, run_single_backtest, PredictionOrigin, PreparedData,
    RunError, RunReport,
};
pub use sweep::{default_thresholds, SweepPoint, SweepResults, ThresholdSweep};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn run_report_is_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
        assert_send::<ResultsFile>();
        assert_sync::<ResultsFile>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<DataSource>();
        assert_sync::<DataSource>();
    }

    #[test]
    fn sweep_types_are_send_sync() {
        assert_send::<ThresholdSweep>();
        assert_sync::<ThresholdSweep>();
        assert_send::<SweepResults>();
        assert_sync::<SweepResults>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }
}
