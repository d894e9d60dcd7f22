//! Integration tests for the runner: CSV files on disk through to artifacts.

use std::path::{Path, PathBuf};

use predlab_core::domain::{Direction, Outcome};
use predlab_runner::config::BacktestConfig;
use predlab_runner::data_loader::DataSource;
use predlab_runner::export::{generate_report, load_results, save_artifacts};
use predlab_runner::runner::{prepare_data, run_single_backtest, PredictionOrigin, RunError};
use predlab_runner::sweep::{default_thresholds, ThresholdSweep};

const SCENARIO_BARS: &str = "\
timestamp,open,high,low,close,volume
2024-01-01 00:00:00,99,101,98,100,10
2024-01-01 01:00:00,100,106,99,105,12
2024-01-01 02:00:00,105,105,102,103,9
";

const SCENARIO_PREDICTIONS: &str = "\
direction,confidence
UP,0.8
DOWN,0.75
";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn file_config(dir: &Path, bars: &str, predictions: &str) -> BacktestConfig {
    let mut config = BacktestConfig::default();
    config.data.bars_path = Some(write(dir, "bars.csv", bars));
    config.data.predictions_path = Some(write(dir, "predictions.csv", predictions));
    config
}

#[test]
fn scenario_a_from_files() {
    let tmp = tempfile::tempdir().unwrap();
    let config = file_config(tmp.path(), SCENARIO_BARS, SCENARIO_PREDICTIONS);
    let report = run_single_backtest(&config).unwrap();

    assert!(matches!(report.source, DataSource::Csv { .. }));
    assert!(matches!(report.predictions, PredictionOrigin::File { .. }));

    let trades = report.result.trades();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].actual_direction, Direction::Up);
    assert_eq!(trades[1].actual_direction, Direction::Down);
    assert!(trades.iter().all(|t| t.outcome == Outcome::Win));
    assert!((trades[0].balance - 1040.0).abs() < 1e-9);
    assert!((trades[1].balance - 1080.0).abs() < 1e-9);

    let m = &report.metrics;
    assert_eq!(m.total_trades, 2);
    assert!((m.win_rate - 1.0).abs() < 1e-12);
    assert!((m.total_profit - 80.0).abs() < 1e-9);
    assert_eq!(m.max_drawdown, 0.0);
    assert_eq!(m.sharpe_ratio, 0.0);
}

#[test]
fn scenario_b_low_confidence_from_files() {
    let tmp = tempfile::tempdir().unwrap();
    let config = file_config(tmp.path(), SCENARIO_BARS, "direction,confidence\nUP,0.8\nDOWN,0.5\n");
    let report = run_single_backtest(&config).unwrap();
    assert_eq!(report.metrics.total_trades, 1);
    assert_eq!(report.result.diagnostics().skipped_low_confidence, 1);
}

#[test]
fn missing_close_cell_is_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let bars = "timestamp,close\n2024-01-01 00:00:00,100\n2024-01-01 01:00:00,\n2024-01-01 02:00:00,103\n2024-01-01 03:00:00,104\n";
    let preds = "direction,confidence\nUP,0.9\nUP,0.9\nUP,0.9\n";
    let report = run_single_backtest(&file_config(tmp.path(), bars, preds)).unwrap();

    // Steps 0 and 1 both touch the void bar at index 1.
    let trades = report.result.trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].index, 2);
    assert_eq!(report.result.diagnostics().skipped_missing_close, 2);
}

#[test]
fn unsorted_bars_are_canonicalized() {
    let tmp = tempfile::tempdir().unwrap();
    let bars = "\
timestamp,close
2024-01-01 02:00:00,103
2024-01-01 00:00:00,100
2024-01-01 01:00:00,105
2024-01-01 01:00:00,999
";
    let report =
        run_single_backtest(&file_config(tmp.path(), bars, SCENARIO_PREDICTIONS)).unwrap();
    assert_eq!(report.duplicates_dropped, 1);
    assert!((report.metrics.total_profit - 80.0).abs() < 1e-9);
}

#[test]
fn prediction_count_mismatch_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let preds = "direction,confidence\nUP,0.8\n";
    let err = run_single_backtest(&file_config(tmp.path(), SCENARIO_BARS, preds)).unwrap_err();
    assert!(matches!(err, RunError::Engine(_)));
}

#[test]
fn max_rows_truncates_long_prediction_file() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = file_config(
        tmp.path(),
        SCENARIO_BARS,
        "direction,confidence\nUP,0.8\nDOWN,0.75\nUP,0.9\nUP,0.9\n",
    );
    config.data.max_rows = Some(2);
    let prepared = prepare_data(&config).unwrap();
    assert_eq!(prepared.series.bars().len(), 2);
    assert_eq!(prepared.series.predictions().len(), 2);
}

#[test]
fn unparseable_bars_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let bars = "timestamp,close\nnot-a-date,100\n";
    let err = run_single_backtest(&file_config(tmp.path(), bars, SCENARIO_PREDICTIONS)).unwrap_err();
    assert!(matches!(err, RunError::Data(_)));
}

#[test]
fn missing_bars_file_falls_back_to_synthetic() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = BacktestConfig::default();
    config.data.bars_path = Some(tmp.path().join("does_not_exist.csv"));
    config.data.synthetic_bars = 120;
    let report = run_single_backtest(&config).unwrap();
    assert!(report.source.is_synthetic());
    assert_eq!(report.result.diagnostics().bars, 120);
}

#[test]
fn config_file_drives_run_and_artifacts_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let config = file_config(tmp.path(), SCENARIO_BARS, SCENARIO_PREDICTIONS);
    let config_path = write(tmp.path(), "backtest.toml", &config.to_toml().unwrap());

    let loaded = BacktestConfig::from_file(&config_path).unwrap();
    assert_eq!(loaded, config);
    let report = run_single_backtest(&loaded).unwrap();

    let out = tmp.path().join("artifacts");
    let dir = save_artifacts(&report, &out).unwrap();
    assert!(dir.starts_with(&out));

    let file = load_results(&dir).unwrap();
    assert_eq!(file.run_id, config.run_id());
    assert_eq!(file.metrics, report.metrics);
    assert_eq!(file.trades, report.result.trades());
    assert_eq!(file.recompute_metrics(), report.metrics);

    let trades_csv = std::fs::read_to_string(dir.join("trades.csv")).unwrap();
    assert_eq!(trades_csv.lines().count(), 3);
    assert!(generate_report(&file).contains("bars.csv"));
}

#[test]
fn sweep_over_prepared_data_matches_single_runs() {
    let mut config = BacktestConfig::default();
    config.data.synthetic = true;
    config.data.synthetic_bars = 400;

    let prepared = prepare_data(&config).unwrap();
    let sweep = ThresholdSweep::new(config.engine_config())
        .run(&prepared.series, &default_thresholds())
        .unwrap();

    for point in sweep.points() {
        let mut single = config.clone();
        single.backtest.min_confidence = point.min_confidence;
        let report = run_single_backtest(&single).unwrap();
        assert_eq!(report.metrics, point.metrics);
    }
}
