//! Backtesting engine: decision rule, payoff policy, and single-pass replay.
//!
//! The engine consumes an aligned bar/prediction series and walks it once:
//!
//! 1. Confidence gate: skip if the prediction's confidence is below threshold
//! 2. Data gate: skip if either close is missing
//! 3. Settle against the next close and apply the payoff
//! 4. Append to the trade ledger and the equity curve

pub mod decision;
pub mod loop_runner;
pub mod policy;
pub mod state;

pub use decision::{decide, Decision, Entry, SkipReason};
pub use loop_runner::{clamp_confidences, replay, run_backtest};
pub use policy::{
    ConfidenceBand, PayoffPolicy, DEFAULT_CONFIDENCE_CEILING, DEFAULT_CONFIDENCE_FLOOR,
    DEFAULT_LOSS_FRACTION, DEFAULT_WIN_PAYOUT,
};
pub use state::{
    BacktestResult, EngineConfig, EngineError, ReplayDiagnostics, RunParameters, RunState,
};
