//! Equity curve samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account balance recorded at the moment a trade settled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquitySample {
    /// Bar index of the trade that produced this sample.
    pub index: usize,
    pub balance: f64,
    #[serde(deserialize_with = "super::timestamp::deserialize_flexible")]
    pub timestamp: DateTime<Utc>,
}
