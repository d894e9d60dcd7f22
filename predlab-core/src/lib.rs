//! PredLab Core: domain types, alignment, decision rule, and backtest engine.
//!
//! This crate contains everything a single backtest needs, with no I/O:
//! - Domain types (bars, predictions, trades, equity samples)
//! - Bar canonicalisation and bar/prediction alignment
//! - The pure confidence-gated decision rule and payoff policy
//! - Single-pass replay producing a `BacktestResult`
//! - SMA/RSI indicators and the heuristic prediction source

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod predictor;
pub mod rng;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared across sweep workers are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Prediction>();
        require_sync::<domain::Prediction>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::EquitySample>();
        require_sync::<domain::EquitySample>();

        require_send::<data::AlignedSeries>();
        require_sync::<data::AlignedSeries>();

        require_send::<engine::EngineConfig>();
        require_sync::<engine::EngineConfig>();
        require_send::<engine::BacktestResult>();
        require_sync::<engine::BacktestResult>();
        require_send::<engine::EngineError>();
        require_sync::<engine::EngineError>();

        require_send::<indicators::Sma>();
        require_sync::<indicators::Sma>();
        require_send::<indicators::Rsi>();
        require_sync::<indicators::Rsi>();
    }

    /// The decision rule only sees a two-bar window.
    #[test]
    fn decide_takes_a_step_not_the_series() {
        fn _check(step: &data::Step<'_>) -> engine::Decision {
            engine::decide(step, 0.7)
        }
    }
}
