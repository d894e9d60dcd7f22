//! Integration tests for the replay engine.
//!
//! Tests:
//! 1. Reference scenarios: all-win run, confidence gate, missing closes, flat bars
//! 2. Input shape: N and N-1 predictions accepted, anything else rejected
//! 3. Run parameters: invalid values fail before the first step
//! 4. Ledger consistency: balances, equity curve, diagnostics

use chrono::{DateTime, Duration, TimeZone, Utc};
use predlab_core::data::AlignError;
use predlab_core::domain::{Bar, Direction, Outcome, Prediction};
use predlab_core::engine::{
    run_backtest, ConfidenceBand, EngineConfig, EngineError, PayoffPolicy,
};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Helper: hourly bars from close prices.
fn bars_from(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::from_close(base_time() + Duration::hours(i as i64), c))
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-10,
        "actual={actual}, expected={expected}"
    );
}

// ── Reference scenarios ──────────────────────────────────────────────

#[test]
fn scenario_two_correct_calls() {
    let result = run_backtest(
        bars_from(&[100.0, 105.0, 103.0]),
        vec![Prediction::up(0.8), Prediction::down(0.75)],
        &EngineConfig::new(1000.0, 50.0, 0.7),
    )
    .unwrap();

    let trades = result.trades();
    assert_eq!(trades.len(), 2);

    assert_eq!(trades[0].index, 0);
    assert_eq!(trades[0].direction, Direction::Up);
    assert_eq!(trades[0].actual_direction, Direction::Up);
    assert_eq!(trades[0].outcome, Outcome::Win);
    assert_close(trades[0].profit, 40.0);
    assert_close(trades[0].balance, 1040.0);
    assert_eq!(trades[0].timestamp, base_time());

    assert_eq!(trades[1].direction, Direction::Down);
    assert_eq!(trades[1].actual_direction, Direction::Down);
    assert_eq!(trades[1].outcome, Outcome::Win);
    assert_close(trades[1].balance, 1080.0);
    assert_close(trades[1].entry_price, 105.0);
    assert_close(trades[1].exit_price, 103.0);

    assert_close(result.final_balance(), 1080.0);
}

#[test]
fn scenario_confidence_gate_drops_one_step() {
    let result = run_backtest(
        bars_from(&[100.0, 105.0, 103.0]),
        vec![Prediction::up(0.8), Prediction::down(0.5)],
        &EngineConfig::new(1000.0, 50.0, 0.7),
    )
    .unwrap();

    assert_eq!(result.trades().len(), 1);
    assert_eq!(result.trades()[0].index, 0);
    assert_eq!(result.diagnostics().skipped_low_confidence, 1);
}

#[test]
fn scenario_missing_close_is_never_traded() {
    let result = run_backtest(
        bars_from(&[100.0, f64::NAN, 103.0, 104.0]),
        vec![Prediction::up(0.8); 4],
        &EngineConfig::default(),
    )
    .unwrap();

    // Step 0 has no exit and step 1 has no entry.
    let trades = result.trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].index, 2);
    assert!(trades.iter().all(|t| t.index != 1 && t.index + 1 != 1));
    assert_eq!(result.diagnostics().skipped_missing_close, 2);
}

#[test]
fn scenario_flat_bar_is_down() {
    let result = run_backtest(
        bars_from(&[100.0, 100.0]),
        vec![Prediction::up(0.8)],
        &EngineConfig::default(),
    )
    .unwrap();

    let t = &result.trades()[0];
    assert_eq!(t.actual_direction, Direction::Down);
    assert_eq!(t.outcome, Outcome::Loss);
    assert_close(t.profit, -25.0);
    assert_close(t.balance, 975.0);
}

#[test]
fn losing_call_costs_half_the_stake() {
    let result = run_backtest(
        bars_from(&[100.0, 90.0]),
        vec![Prediction::up(0.9)],
        &EngineConfig::new(1000.0, 20.0, 0.7),
    )
    .unwrap();
    assert_close(result.trades()[0].profit, -10.0);
    assert_close(result.final_balance(), 990.0);
}

#[test]
fn custom_payoff_is_applied() {
    let config = EngineConfig::default().with_payoff(PayoffPolicy::new(1.0, 1.0));
    let result = run_backtest(
        bars_from(&[100.0, 101.0, 100.0]),
        vec![Prediction::up(0.8), Prediction::up(0.8)],
        &config,
    )
    .unwrap();
    assert_close(result.trades()[0].profit, 50.0);
    assert_close(result.trades()[1].profit, -50.0);
    assert_close(result.final_balance(), 1000.0);
}

#[test]
fn no_trades_keeps_initial_balance() {
    let result = run_backtest(
        bars_from(&[100.0, 101.0, 102.0]),
        vec![Prediction::up(0.55); 3],
        &EngineConfig::default(),
    )
    .unwrap();
    assert!(result.trades().is_empty());
    assert!(result.equity_curve().is_empty());
    assert_close(result.final_balance(), 1000.0);
}

#[test]
fn wide_band_keeps_raw_confidence() {
    let config = EngineConfig::default().with_confidence_band(ConfidenceBand::new(0.0, 1.0));
    let result = run_backtest(
        bars_from(&[100.0, 101.0]),
        vec![Prediction::up(0.97)],
        &config,
    )
    .unwrap();
    assert_close(result.trades()[0].confidence, 0.97);
}

// ── Input shape ──────────────────────────────────────────────────────

#[test]
fn prediction_for_last_bar_is_ignored() {
    let with_last = run_backtest(
        bars_from(&[100.0, 105.0, 103.0]),
        vec![Prediction::up(0.8), Prediction::down(0.75), Prediction::up(0.9)],
        &EngineConfig::default(),
    )
    .unwrap();
    let without_last = run_backtest(
        bars_from(&[100.0, 105.0, 103.0]),
        vec![Prediction::up(0.8), Prediction::down(0.75)],
        &EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(with_last.trades(), without_last.trades());
}

#[test]
fn short_prediction_sequence_is_rejected() {
    let err = run_backtest(
        bars_from(&[100.0, 101.0, 102.0, 103.0]),
        vec![Prediction::up(0.8); 2],
        &EngineConfig::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        EngineError::Align(AlignError::LengthMismatch {
            bars: 4,
            predictions: 2
        })
    );
}

#[test]
fn single_bar_is_rejected() {
    let err = run_backtest(bars_from(&[100.0]), vec![], &EngineConfig::default()).unwrap_err();
    assert_eq!(err, EngineError::Align(AlignError::TooFewBars(1)));
}

// ── Run parameters ───────────────────────────────────────────────────

#[test]
fn invalid_parameters_are_fatal() {
    let bars = bars_from(&[100.0, 101.0]);
    let preds = vec![Prediction::up(0.8)];

    let cases = [
        EngineConfig::new(1000.0, -1.0, 0.7),
        EngineConfig::new(f64::NAN, 50.0, 0.7),
        EngineConfig::new(1000.0, 50.0, 1.5),
    ];
    for config in cases {
        assert!(run_backtest(bars.clone(), preds.clone(), &config).is_err());
    }
}

// ── Ledger consistency ───────────────────────────────────────────────

#[test]
fn equity_curve_mirrors_trades() {
    let closes = [100.0, 101.0, 99.0, 99.0, 102.0, 98.0, 97.0];
    let preds = vec![
        Prediction::up(0.8),
        Prediction::up(0.9),
        Prediction::down(0.6),
        Prediction::up(0.75),
        Prediction::down(0.7),
        Prediction::down(0.85),
    ];
    let result = run_backtest(bars_from(&closes), preds, &EngineConfig::default()).unwrap();

    let trades = result.trades();
    let curve = result.equity_curve();
    assert_eq!(trades.len(), 5);
    assert_eq!(curve.len(), trades.len());

    let mut balance = 1000.0;
    for (t, e) in trades.iter().zip(curve) {
        balance += t.profit;
        assert_close(t.balance, balance);
        assert_close(e.balance, t.balance);
        assert_eq!(e.index, t.index);
        assert_eq!(e.timestamp, t.timestamp);
    }

    let diag = result.diagnostics();
    assert_eq!(diag.bars, 7);
    assert_eq!(diag.evaluated, 6);
    assert_eq!(diag.traded(), 5);
}
