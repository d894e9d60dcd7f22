//! Deterministic seed streams.
//!
//! One master seed is expanded into independent named streams ("bars",
//! "predictor", ...) via BLAKE3, so drawing more numbers from one stream never
//! shifts the values another stream produces.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stream used by the synthetic bar generator.
pub const BARS_STREAM: &str = "bars";
/// Stream used by the heuristic predictor's warm-up fallback.
pub const PREDICTOR_STREAM: &str = "predictor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedStreams {
    master_seed: u64,
}

impl SeedStreams {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Deterministic sub-seed for a named stream.
    pub fn sub_seed(&self, stream: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        let hash = hasher.finalize();
        let mut first = [0u8; 8];
        first.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(first)
    }

    pub fn rng_for(&self, stream: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream))
    }
}
