//! Trade: one settled directional call, the ledger's unit of record.

use super::prediction::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a trade's predicted direction matched the realized one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn from_correct(is_correct: bool) -> Self {
        if is_correct {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
        }
    }
}

/// A settled one-bar trade.
///
/// Serialized field names follow the results file consumed by the reporting
/// tools (`direction` is the predicted side, `result` the outcome).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Index of the entry bar in the replayed sequence. Absent in files
    /// written before the index was recorded.
    #[serde(default)]
    pub index: usize,
    #[serde(deserialize_with = "super::timestamp::deserialize_flexible")]
    pub timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub direction: Direction,
    pub confidence: f64,
    pub actual_direction: Direction,
    #[serde(rename = "result")]
    pub outcome: Outcome,
    pub profit: f64,
    /// Running balance after this trade settled.
    pub balance: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.outcome == Outcome::Win
    }

    /// Profit normalised by the stake that produced it.
    pub fn return_on_stake(&self, stake: f64) -> f64 {
        if stake == 0.0 {
            return 0.0;
        }
        self.profit / stake
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> Trade {
        Trade {
            index: 0,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            entry_price: 100.0,
            exit_price: 105.0,
            direction: Direction::Up,
            confidence: 0.8,
            actual_direction: Direction::Up,
            outcome: Outcome::Win,
            profit: 40.0,
            balance: 1040.0,
        }
    }

    #[test]
    fn winner_flag_follows_outcome() {
        assert!(sample_trade().is_winner());
        let mut t = sample_trade();
        t.outcome = Outcome::Loss;
        assert!(!t.is_winner());
    }

    #[test]
    fn return_on_stake() {
        assert!((sample_trade().return_on_stake(50.0) - 0.8).abs() < 1e-12);
        assert_eq!(sample_trade().return_on_stake(0.0), 0.0);
    }

    #[test]
    fn uses_interop_field_names() {
        let value = serde_json::to_value(sample_trade()).unwrap();
        assert_eq!(value["result"], "WIN");
        assert_eq!(value["direction"], "UP");
        assert_eq!(value["actual_direction"], "UP");
        assert_eq!(value["timestamp"], "2024-01-01T00:00:00Z");
        assert!(value.get("outcome").is_none());
    }
}
