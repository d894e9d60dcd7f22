//! Engine configuration, run-scoped state, and run result types.

use super::decision::{Entry, SkipReason};
use super::policy::{ConfidenceBand, PayoffPolicy};
use crate::data::{AlignError, Step};
use crate::domain::{EquitySample, Trade};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal preconditions. Checked before the first step is evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Align(#[from] AlignError),

    #[error("stake must be finite and > 0, got {0}")]
    InvalidStake(f64),

    #[error("initial balance must be finite and non-zero, got {0}")]
    InvalidInitialBalance(f64),

    #[error("min_confidence must be in [0, 1], got {0}")]
    InvalidMinConfidence(f64),

    #[error("payoff fractions must be finite and >= 0 (win {win_payout}, loss {loss_fraction})")]
    InvalidPayoff { win_payout: f64, loss_fraction: f64 },

    #[error("confidence band [{floor}, {ceiling}] is not a valid range")]
    InvalidConfidenceBand { floor: f64, ceiling: f64 },
}

/// Configuration for a single backtest run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub initial_balance: f64,
    /// Fixed amount risked on every trade.
    pub stake: f64,
    /// Inclusive confidence threshold.
    pub min_confidence: f64,
    pub payoff: PayoffPolicy,
    /// Band predictions are clamped into on ingest.
    pub confidence_band: ConfidenceBand,
}

impl EngineConfig {
    pub fn new(initial_balance: f64, stake: f64, min_confidence: f64) -> Self {
        Self {
            initial_balance,
            stake,
            min_confidence,
            payoff: PayoffPolicy::default(),
            confidence_band: ConfidenceBand::default(),
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_payoff(mut self, payoff: PayoffPolicy) -> Self {
        self.payoff = payoff;
        self
    }

    pub fn with_confidence_band(mut self, band: ConfidenceBand) -> Self {
        self.confidence_band = band;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.stake.is_finite() || self.stake <= 0.0 {
            return Err(EngineError::InvalidStake(self.stake));
        }
        if !self.initial_balance.is_finite() || self.initial_balance == 0.0 {
            return Err(EngineError::InvalidInitialBalance(self.initial_balance));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(EngineError::InvalidMinConfidence(self.min_confidence));
        }
        if !self.payoff.is_valid() {
            return Err(EngineError::InvalidPayoff {
                win_payout: self.payoff.win_payout,
                loss_fraction: self.payoff.loss_fraction,
            });
        }
        if !self.confidence_band.is_valid() {
            return Err(EngineError::InvalidConfidenceBand {
                floor: self.confidence_band.floor,
                ceiling: self.confidence_band.ceiling,
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(1000.0, 50.0, 0.7)
    }
}

/// Parameters a run was started with, as recorded in the results file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub initial_balance: f64,
    #[serde(alias = "trade_amount")]
    pub stake: f64,
    #[serde(default)]
    pub min_confidence: f64,
    #[serde(default = "default_win_payout")]
    pub win_payout: f64,
    #[serde(default = "default_loss_fraction")]
    pub loss_fraction: f64,
}

fn default_win_payout() -> f64 {
    super::policy::DEFAULT_WIN_PAYOUT
}

fn default_loss_fraction() -> f64 {
    super::policy::DEFAULT_LOSS_FRACTION
}

impl From<&EngineConfig> for RunParameters {
    fn from(config: &EngineConfig) -> Self {
        Self {
            initial_balance: config.initial_balance,
            stake: config.stake,
            min_confidence: config.min_confidence,
            win_payout: config.payoff.win_payout,
            loss_fraction: config.payoff.loss_fraction,
        }
    }
}

/// Counters describing how the replay treated each step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayDiagnostics {
    pub bars: usize,
    /// Steps that reached the decision rule (N - 1).
    pub evaluated: usize,
    pub skipped_low_confidence: usize,
    pub skipped_missing_close: usize,
}

impl ReplayDiagnostics {
    pub fn traded(&self) -> usize {
        self.evaluated - self.skipped_low_confidence - self.skipped_missing_close
    }
}

/// Mutable state owned by exactly one run: balance accumulator plus ledger.
#[derive(Debug)]
pub struct RunState {
    balance: f64,
    trades: Vec<Trade>,
    equity_curve: Vec<EquitySample>,
    diagnostics: ReplayDiagnostics,
}

impl RunState {
    pub fn new(initial_balance: f64, bars: usize) -> Self {
        Self {
            balance: initial_balance,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            diagnostics: ReplayDiagnostics {
                bars,
                ..ReplayDiagnostics::default()
            },
        }
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        self.diagnostics.evaluated += 1;
        match reason {
            SkipReason::LowConfidence => self.diagnostics.skipped_low_confidence += 1,
            SkipReason::MissingClose => self.diagnostics.skipped_missing_close += 1,
        }
    }

    /// Apply the payoff, advance the balance, and append to both ledgers.
    pub fn settle(
        &mut self,
        step: &Step<'_>,
        entry: &Entry,
        payoff: &PayoffPolicy,
        stake: f64,
    ) -> &Trade {
        self.diagnostics.evaluated += 1;
        let profit = payoff.profit(entry.outcome, stake);
        self.balance += profit;

        let timestamp = step.bar.timestamp;
        self.equity_curve.push(EquitySample {
            index: step.index,
            balance: self.balance,
            timestamp,
        });
        self.trades.push(Trade {
            index: step.index,
            timestamp,
            entry_price: entry.entry_price,
            exit_price: entry.exit_price,
            direction: entry.predicted,
            confidence: entry.confidence,
            actual_direction: entry.actual,
            outcome: entry.outcome,
            profit,
            balance: self.balance,
        });
        &self.trades[self.trades.len() - 1]
    }

    pub fn finish(self, parameters: RunParameters) -> BacktestResult {
        BacktestResult {
            final_balance: self.balance,
            trades: self.trades,
            equity_curve: self.equity_curve,
            parameters,
            diagnostics: self.diagnostics,
        }
    }
}

/// Result of a complete backtest run. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    trades: Vec<Trade>,
    equity_curve: Vec<EquitySample>,
    parameters: RunParameters,
    #[serde(default)]
    diagnostics: ReplayDiagnostics,
    final_balance: f64,
}

impl BacktestResult {
    /// Rebuild a result from a persisted ledger. The final balance is taken
    /// from the last trade.
    pub fn from_ledger(
        trades: Vec<Trade>,
        equity_curve: Vec<EquitySample>,
        parameters: RunParameters,
    ) -> Self {
        let final_balance = trades
            .last()
            .map(|t| t.balance)
            .unwrap_or(parameters.initial_balance);
        Self {
            trades,
            equity_curve,
            parameters,
            diagnostics: ReplayDiagnostics::default(),
            final_balance,
        }
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquitySample] {
        &self.equity_curve
    }

    pub fn parameters(&self) -> &RunParameters {
        &self.parameters
    }

    pub fn diagnostics(&self) -> &ReplayDiagnostics {
        &self.diagnostics
    }

    pub fn initial_balance(&self) -> f64 {
        self.parameters.initial_balance
    }

    pub fn stake(&self) -> f64 {
        self.parameters.stake
    }

    /// Balance after the last trade, or the initial balance if none.
    pub fn final_balance(&self) -> f64 {
        self.final_balance
    }
}
