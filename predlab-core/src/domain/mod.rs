//! Domain types for PredLab

pub mod bar;
pub mod equity;
pub mod prediction;
pub mod timestamp;
pub mod trade;

pub use bar::Bar;
pub use equity::EquitySample;
pub use prediction::{Direction, ParseDirectionError, Prediction};
pub use timestamp::parse_timestamp;
pub use trade::{Outcome, Trade};
