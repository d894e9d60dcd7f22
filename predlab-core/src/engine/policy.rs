//! Strategy policy constants: payoff schedule and confidence band.

use crate::domain::Outcome;
use serde::{Deserialize, Serialize};

/// Default fraction of the stake gained on a correct call.
pub const DEFAULT_WIN_PAYOUT: f64 = 0.8;
/// Default fraction of the stake lost on an incorrect call.
pub const DEFAULT_LOSS_FRACTION: f64 = 0.5;
/// Default lower bound of producer confidence.
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.5;
/// Default upper bound of producer confidence.
pub const DEFAULT_CONFIDENCE_CEILING: f64 = 0.9;

/// Fixed asymmetric payoff of a binary-option style contract.
///
/// A win pays `stake * win_payout`, a loss costs `stake * loss_fraction`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoffPolicy {
    pub win_payout: f64,
    pub loss_fraction: f64,
}

impl PayoffPolicy {
    pub fn new(win_payout: f64, loss_fraction: f64) -> Self {
        Self {
            win_payout,
            loss_fraction,
        }
    }

    /// Signed profit for a settled trade.
    pub fn profit(&self, outcome: Outcome, stake: f64) -> f64 {
        match outcome {
            Outcome::Win => stake * self.win_payout,
            Outcome::Loss => -stake * self.loss_fraction,
        }
    }

    /// Win rate at which expected profit per trade is zero.
    pub fn breakeven_win_rate(&self) -> f64 {
        let total = self.win_payout + self.loss_fraction;
        if total <= 0.0 {
            return 0.0;
        }
        self.loss_fraction / total
    }

    pub fn is_valid(&self) -> bool {
        self.win_payout.is_finite()
            && self.loss_fraction.is_finite()
            && self.win_payout >= 0.0
            && self.loss_fraction >= 0.0
    }
}

impl Default for PayoffPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WIN_PAYOUT, DEFAULT_LOSS_FRACTION)
    }
}

/// Range that incoming confidences are clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub floor: f64,
    pub ceiling: f64,
}

impl ConfidenceBand {
    pub fn new(floor: f64, ceiling: f64) -> Self {
        Self { floor, ceiling }
    }

    /// Clamp a finite confidence into the band. Non-finite input is returned
    /// unchanged so the confidence gate can reject it.
    pub fn clamp(&self, confidence: f64) -> f64 {
        if !confidence.is_finite() {
            return confidence;
        }
        confidence.max(self.floor).min(self.ceiling)
    }

    pub fn is_valid(&self) -> bool {
        self.floor.is_finite() && self.ceiling.is_finite() && self.floor <= self.ceiling
    }
}

impl Default for ConfidenceBand {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_FLOOR, DEFAULT_CONFIDENCE_CEILING)
    }
}
