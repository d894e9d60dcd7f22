//! Canonical bar ordering: sort by timestamp, drop duplicate timestamps.

use crate::domain::Bar;

/// Bars in canonical order plus a count of what was removed.
#[derive(Debug, Clone)]
pub struct CanonicalBars {
    pub bars: Vec<Bar>,
    pub duplicates_dropped: usize,
}

/// Sort bars by timestamp (stable) and keep the first bar per timestamp.
pub fn canonicalize(mut bars: Vec<Bar>) -> CanonicalBars {
    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    CanonicalBars {
        duplicates_dropped: before - bars.len(),
        bars,
    }
}

/// Returns true if timestamps never decrease.
pub fn is_chronological(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}
