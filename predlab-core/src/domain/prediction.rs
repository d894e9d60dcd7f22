//! Model predictions consumed by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a price move over one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[serde(alias = "ALTA")]
    Up,
    #[serde(alias = "BAIXA")]
    Down,
}

impl Direction {
    /// Realized direction between two closes.
    ///
    /// Strict comparison: an unchanged close resolves to `Down`.
    pub fn between(entry: f64, exit: f64) -> Self {
        if exit > entry {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction '{0}' (expected UP or DOWN)")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    /// Accepts `UP`/`DOWN` in any case, plus the `ALTA`/`BAIXA` labels
    /// emitted by older model exports.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" | "ALTA" => Ok(Direction::Up),
            "DOWN" | "BAIXA" => Ok(Direction::Down),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// A directional call with a confidence score, paired with one bar by position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub direction: Direction,
    pub confidence: f64,
}

impl Prediction {
    pub fn new(direction: Direction, confidence: f64) -> Self {
        Self {
            direction,
            confidence,
        }
    }

    pub fn up(confidence: f64) -> Self {
        Self::new(Direction::Up, confidence)
    }

    pub fn down(confidence: f64) -> Self {
        Self::new(Direction::Down, confidence)
    }
}
