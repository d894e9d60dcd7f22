//! Serializable backtest configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid config.

use std::path::{Path, PathBuf};

use predlab_core::engine::{ConfidenceBand, EngineConfig, EngineError, PayoffPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid engine parameters: {0}")]
    Engine(#[from] EngineError),
    #[error("invalid predictor parameters: {0}")]
    Predictor(String),
    #[error("invalid data parameters: {0}")]
    Data(String),
}

/// Complete configuration of one backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub policy: PolicySection,
    pub data: DataSection,
    pub predictor: PredictorSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_balance: f64,
    pub stake: f64,
    pub min_confidence: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_balance: 1000.0,
            stake: 50.0,
            min_confidence: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySection {
    pub win_payout: f64,
    pub loss_fraction: f64,
    pub confidence_floor: f64,
    pub confidence_ceiling: f64,
}

impl Default for PolicySection {
    fn default() -> Self {
        let payoff = PayoffPolicy::default();
        let band = ConfidenceBand::default();
        Self {
            win_payout: payoff.win_payout,
            loss_fraction: payoff.loss_fraction,
            confidence_floor: band.floor,
            confidence_ceiling: band.ceiling,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Bars CSV. Absent or unreadable falls back to synthetic bars.
    pub bars_path: Option<PathBuf>,
    /// Predictions CSV. Absent means the heuristic predictor is used.
    pub predictions_path: Option<PathBuf>,
    /// Keep at most this many rows from the bars file.
    pub max_rows: Option<usize>,
    /// Skip the bars file entirely and generate a random walk.
    pub synthetic: bool,
    pub synthetic_bars: usize,
    pub seed: u64,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            bars_path: None,
            predictions_path: None,
            max_rows: None,
            synthetic: false,
            synthetic_bars: 1000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorSection {
    pub fast_sma: usize,
    pub slow_sma: usize,
    pub rsi_period: usize,
}

impl Default for PredictorSection {
    fn default() -> Self {
        Self {
            fast_sma: 5,
            slow_sma: 20,
            rsi_period: 14,
        }
    }
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Engine parameters for this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(
            self.backtest.initial_balance,
            self.backtest.stake,
            self.backtest.min_confidence,
        )
        .with_payoff(PayoffPolicy::new(
            self.policy.win_payout,
            self.policy.loss_fraction,
        ))
        .with_confidence_band(ConfidenceBand::new(
            self.policy.confidence_floor,
            self.policy.confidence_ceiling,
        ))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config().validate()?;

        let p = &self.predictor;
        if p.fast_sma == 0 || p.slow_sma == 0 || p.rsi_period == 0 {
            return Err(ConfigError::Predictor(
                "indicator periods must be >= 1".into(),
            ));
        }
        if p.fast_sma >= p.slow_sma {
            return Err(ConfigError::Predictor(format!(
                "fast_sma ({}) must be shorter than slow_sma ({})",
                p.fast_sma, p.slow_sma
            )));
        }
        if self.data.synthetic_bars < 2 {
            return Err(ConfigError::Data(format!(
                "synthetic_bars must be >= 2, got {}",
                self.data.synthetic_bars
            )));
        }
        if self.data.max_rows == Some(0) {
            return Err(ConfigError::Data("max_rows must be >= 1".into()));
        }
        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId (and an artifact
    /// directory).
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = BacktestConfig::from_toml("").unwrap();
        assert_eq!(config, BacktestConfig::default());
        assert_eq!(config.backtest.initial_balance, 1000.0);
        assert_eq!(config.backtest.stake, 50.0);
        assert_eq!(config.backtest.min_confidence, 0.7);
        assert_eq!(config.policy.win_payout, 0.8);
        assert_eq!(config.data.seed, 42);
        assert_eq!(config.predictor.slow_sma, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = BacktestConfig::from_toml(
            r#"
            [backtest]
            stake = 10.0

            [data]
            bars_path = "processed_btc_data.csv"
            max_rows = 10000
            "#,
        )
        .unwrap();
        assert_eq!(config.backtest.stake, 10.0);
        assert_eq!(config.backtest.initial_balance, 1000.0);
        assert_eq!(
            config.data.bars_path.as_deref(),
            Some(Path::new("processed_btc_data.csv"))
        );
        assert_eq!(config.data.max_rows, Some(10000));
        assert!(!config.data.synthetic);
    }

    #[test]
    fn engine_config_carries_policy() {
        let config = BacktestConfig::from_toml(
            r#"
            [policy]
            win_payout = 0.9
            loss_fraction = 1.0
            confidence_ceiling = 0.95
            "#,
        )
        .unwrap();
        let engine = config.engine_config();
        assert_eq!(engine.payoff.win_payout, 0.9);
        assert_eq!(engine.payoff.loss_fraction, 1.0);
        assert_eq!(engine.confidence_band.ceiling, 0.95);
        assert_eq!(engine.confidence_band.floor, 0.5);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = BacktestConfig::default();
        config.backtest.stake = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Engine(_))));

        let mut config = BacktestConfig::default();
        config.predictor.fast_sma = 30;
        assert!(matches!(config.validate(), Err(ConfigError::Predictor(_))));

        let mut config = BacktestConfig::default();
        config.data.synthetic_bars = 1;
        assert!(matches!(config.validate(), Err(ConfigError::Data(_))));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = BacktestConfig::from_toml("[backtest\nstake = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_run_id_deterministic() {
        let config = BacktestConfig::default();
        let id = config.run_id();
        assert_eq!(id, config.run_id());
        assert_eq!(id.len(), 64);
    }

    #[test]
    fn test_run_id_changes_with_params() {
        let a = BacktestConfig::default();
        let mut b = a.clone();
        b.backtest.min_confidence = 0.8;
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn toml_round_trip() {
        let mut config = BacktestConfig::default();
        config.data.bars_path = Some(PathBuf::from("bars.csv"));
        let text = config.to_toml().unwrap();
        assert_eq!(BacktestConfig::from_toml(&text).unwrap(), config);
    }
}
