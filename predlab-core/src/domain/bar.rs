//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One time-stamped OHLCV observation.
///
/// Missing values use the void convention: a non-finite field (NaN) means the
/// upstream source had no value for it. Only `close` is read by the engine.
///
/// Indicator values are optional per bar. An indicator that is absent from the
/// map, or present but non-finite (warm-up), is undefined for this bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub indicators: BTreeMap<String, f64>,
}

impl Bar {
    /// Bar with only a close price; the other OHLC fields mirror it.
    pub fn from_close(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            indicators: BTreeMap::new(),
        }
    }

    /// The close price, or `None` when it is missing.
    pub fn close_price(&self) -> Option<f64> {
        self.close.is_finite().then_some(self.close)
    }

    /// Returns true if the close is missing.
    pub fn is_void(&self) -> bool {
        self.close_price().is_none()
    }

    /// A defined indicator value, or `None` during warm-up / when absent.
    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators.get(name).copied().filter(|v| v.is_finite())
    }

    pub fn set_indicator(&mut self, name: impl Into<String>, value: f64) {
        self.indicators.insert(name.into(), value);
    }
}
