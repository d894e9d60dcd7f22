//! Bar canonicalisation and bar/prediction alignment.

pub mod align;
pub mod canonicalize;

pub use align::{align, AlignError, AlignedSeries, Step};
pub use canonicalize::{canonicalize, is_chronological, CanonicalBars};
