//! The confidence-gated, no-lookahead decision rule.
//!
//! Pure: a step in, a decision out. No balance, no ledger. The rule reads the
//! decision bar's close, the next bar's close, and the prediction made at the
//! decision bar, and nothing else.

use crate::data::Step;
use crate::domain::{Direction, Outcome};

/// Why a step produced no trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Confidence below the threshold (or not a number).
    LowConfidence,
    /// Close missing on the decision bar or the settlement bar.
    MissingClose,
}

/// Result of evaluating one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Skip(SkipReason),
    Enter(Entry),
}

/// A trade the rule accepted, already settled against the next close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub entry_price: f64,
    pub exit_price: f64,
    pub predicted: Direction,
    pub actual: Direction,
    pub confidence: f64,
    pub outcome: Outcome,
}

/// Evaluate one step against `min_confidence`.
///
/// The confidence gate is checked before data availability.
pub fn decide(step: &Step<'_>, min_confidence: f64) -> Decision {
    let confidence = step.prediction.confidence;
    // `!(a >= b)` so that NaN fails the gate.
    if !(confidence >= min_confidence) {
        return Decision::Skip(SkipReason::LowConfidence);
    }

    let (entry_price, exit_price) = match (step.bar.close_price(), step.next.close_price()) {
        (Some(entry), Some(exit)) => (entry, exit),
        _ => return Decision::Skip(SkipReason::MissingClose),
    };

    let actual = Direction::between(entry_price, exit_price);
    let predicted = step.prediction.direction;

    Decision::Enter(Entry {
        entry_price,
        exit_price,
        predicted,
        actual,
        confidence,
        outcome: Outcome::from_correct(predicted == actual),
    })
}
