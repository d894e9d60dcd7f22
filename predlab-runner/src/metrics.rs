//! Performance metrics: pure functions that compute run statistics.
//!
//! Every metric is a pure function: trade list and/or equity curve in, scalar
//! out. Degenerate inputs (no trades, zero spread) resolve to 0, never NaN.

use predlab_core::domain::{EquitySample, Trade};
use predlab_core::engine::BacktestResult;
use serde::{Deserialize, Serialize};

/// Standard deviations below this are treated as zero.
const STD_EPSILON: f64 = 1e-12;

/// Aggregate performance metrics for a single backtest run.
///
/// `total_return` and `max_drawdown` are percentages; `win_rate` is a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_profit: f64,
    pub total_return: f64,
    pub avg_profit_per_trade: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub final_balance: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a finished run.
    pub fn compute(result: &BacktestResult) -> Self {
        let trades = result.trades();
        let initial = result.initial_balance();
        let final_balance = result.final_balance();
        let winning = winning_trades(trades);
        Self {
            total_trades: trades.len(),
            winning_trades: winning,
            losing_trades: trades.len() - winning,
            win_rate: win_rate(trades),
            total_profit: total_profit(trades),
            total_return: total_return(initial, final_balance),
            avg_profit_per_trade: avg_profit_per_trade(trades),
            max_drawdown: max_drawdown(initial, result.equity_curve()),
            sharpe_ratio: sharpe_ratio(trades, result.stake()),
            final_balance,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn winning_trades(trades: &[Trade]) -> usize {
    trades.iter().filter(|t| t.is_winner()).count()
}

/// Fraction of trades that won. 0.0 when there are no trades.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    winning_trades(trades) as f64 / trades.len() as f64
}

pub fn total_profit(trades: &[Trade]) -> f64 {
    trades.iter().map(|t| t.profit).sum()
}

/// Total return in percent: (final - initial) / initial * 100.
pub fn total_return(initial_balance: f64, final_balance: f64) -> f64 {
    if initial_balance == 0.0 {
        return 0.0;
    }
    (final_balance - initial_balance) / initial_balance * 100.0
}

/// Mean profit per trade. 0.0 when there are no trades.
pub fn avg_profit_per_trade(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    total_profit(trades) / trades.len() as f64
}

/// Maximum peak-to-trough decline in percent (e.g. 15.0 = 15% drawdown).
///
/// The running peak starts at the initial balance, so a first trade that loses
/// already counts as drawdown. Returns 0.0 if the balance never falls below
/// its running peak. Peaks at or below zero are skipped.
pub fn max_drawdown(initial_balance: f64, equity_curve: &[EquitySample]) -> f64 {
    let mut peak = initial_balance;
    let mut max_dd = 0.0_f64;

    for sample in equity_curve {
        peak = peak.max(sample.balance);
        if peak > 0.0 {
            let dd = (peak - sample.balance) / peak * 100.0;
            max_dd = max_dd.max(dd);
        }
    }

    max_dd
}

/// Per-trade Sharpe ratio on stake-normalised returns.
///
/// Sharpe = mean(profit / stake) / population_std(profit / stake).
/// Not annualised. Returns 0.0 for fewer than 2 trades or zero spread.
pub fn sharpe_ratio(trades: &[Trade], stake: f64) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = trades.iter().map(|t| t.return_on_stake(stake)).collect();
    let std = population_std_dev(&returns);
    if std < STD_EPSILON {
        return 0.0;
    }
    mean_f64(&returns) / std
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with divisor N.
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
