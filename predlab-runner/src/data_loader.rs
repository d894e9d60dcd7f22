//! Bar and prediction loading for the runner.
//!
//! Bars come from a CSV file or from a seeded random walk. Fallback policy:
//! 1. `synthetic = true` → generate synthetic bars
//! 2. `bars_path` set and the file exists → read it
//! 3. `bars_path` set but missing, or unset → generate synthetic bars (tagged)
//!
//! A file that exists but cannot be parsed is an error, never a fallback.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{Duration, TimeZone, Utc};
use predlab_core::data::canonicalize;
use predlab_core::domain::{Bar, Direction, ParseDirectionError, Prediction};

pub use predlab_core::domain::parse_timestamp;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DataSection;

/// Starting price of the synthetic random walk.
pub const SYNTHETIC_BASE_PRICE: f64 = 50_000.0;
/// Per-bar standard deviation of the synthetic random walk.
pub const SYNTHETIC_STEP_STD: f64 = 100.0;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: cannot parse timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },

    #[error("row {row}: column '{column}' is not a number: '{value}'")]
    BadNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: {source}")]
    BadDirection {
        row: usize,
        #[source]
        source: ParseDirectionError,
    },

    #[error("no bars loaded")]
    Empty,
}

/// Where a run's bars came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Csv { path: PathBuf },
    Synthetic { seed: u64 },
}

impl DataSource {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic { .. })
    }
}

/// Bars ready for a run, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// Rows removed because their timestamp was already seen.
    pub duplicates_dropped: usize,
}

/// Resolve and load bars according to the `[data]` section.
///
/// `rng` is only drawn from when synthetic bars are generated.
pub fn load_bars(data: &DataSection, rng: &mut StdRng) -> Result<LoadedData, LoadError> {
    if !data.synthetic {
        match &data.bars_path {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "loading bars from csv");
                let bars = load_bars_csv(path, data.max_rows)?;
                let canonical = canonicalize(bars);
                if canonical.duplicates_dropped > 0 {
                    tracing::warn!(
                        dropped = canonical.duplicates_dropped,
                        "duplicate timestamps dropped"
                    );
                }
                return Ok(LoadedData {
                    bars: canonical.bars,
                    source: DataSource::Csv { path: path.clone() },
                    duplicates_dropped: canonical.duplicates_dropped,
                });
            }
            Some(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "bars file not found, generating synthetic data"
                );
            }
            None => tracing::info!("no bars file configured, generating synthetic data"),
        }
    }

    tracing::info!(bars = data.synthetic_bars, seed = data.seed, "generating synthetic bars");
    Ok(LoadedData {
        bars: generate_synthetic_bars(data.synthetic_bars, rng),
        source: DataSource::Synthetic { seed: data.seed },
        duplicates_dropped: 0,
    })
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub fn load_bars_csv(path: &Path, max_rows: Option<usize>) -> Result<Vec<Bar>, LoadError> {
    read_bars_csv(open(path)?, max_rows)
}

pub fn load_predictions_csv(path: &Path) -> Result<Vec<Prediction>, LoadError> {
    tracing::info!(path = %path.display(), "loading predictions from csv");
    read_predictions_csv(open(path)?)
}

// ─── Bars CSV ───────────────────────────────────────────────────────

const OHLCV: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

/// Read bars in file order.
///
/// Required columns: `timestamp`, `close`. `open`/`high`/`low` default to the
/// close and `volume` to 0 when the column is absent. Every other column is an
/// indicator; its non-numeric cells are ignored. Empty cells are missing values.
pub fn read_bars_csv<R: Read>(reader: R, max_rows: Option<usize>) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let ts_col = column("timestamp").ok_or(LoadError::MissingColumn("timestamp"))?;
    let close_col = column("close").ok_or(LoadError::MissingColumn("close"))?;
    let (open_col, high_col, low_col, volume_col) =
        (column("open"), column("high"), column("low"), column("volume"));
    let extra: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.is_empty() && !OHLCV.contains(&h.as_str()))
        .map(|(i, h)| (i, h.as_str()))
        .collect();

    let limit = max_rows.unwrap_or(usize::MAX);
    let mut bars = Vec::new();

    for (row, record) in rdr.records().take(limit).enumerate() {
        let record = record?;
        let cell = |i: usize| record.get(i).unwrap_or("");
        let number = |i: usize| parse_number(cell(i), row, &headers[i]);

        let raw_ts = cell(ts_col);
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| LoadError::BadTimestamp {
            row,
            value: raw_ts.to_string(),
        })?;
        let close = number(close_col)?;
        let or_close = |col: Option<usize>| col.map(number).unwrap_or(Ok(close));

        let mut bar = Bar {
            timestamp,
            open: or_close(open_col)?,
            high: or_close(high_col)?,
            low: or_close(low_col)?,
            close,
            volume: volume_col.map(number).unwrap_or(Ok(0.0))?,
            indicators: Default::default(),
        };
        for &(i, name) in &extra {
            if let Ok(v) = parse_number(cell(i), row, name) {
                bar.set_indicator(name, v);
            }
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(bars)
}

/// Empty cells (and `nan`/`null` markers) are missing values.
fn parse_number(raw: &str, row: usize, column: &str) -> Result<f64, LoadError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("null") {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| LoadError::BadNumber {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

// ─── Predictions CSV ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PredictionRow {
    direction: String,
    confidence: f64,
}

/// Read predictions in file order. Extra columns are ignored.
pub fn read_predictions_csv<R: Read>(reader: R) -> Result<Vec<Prediction>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut predictions = Vec::new();
    for (row, result) in rdr.deserialize::<PredictionRow>().enumerate() {
        let record = result?;
        let direction: Direction = record
            .direction
            .parse()
            .map_err(|source| LoadError::BadDirection { row, source })?;
        predictions.push(Prediction::new(direction, record.confidence));
    }
    Ok(predictions)
}

// ─── Synthetic bars ─────────────────────────────────────────────────

/// Hourly random walk starting 2024-01-01 00:00 UTC at 50,000 with
/// normally distributed steps (σ = 100). Deterministic for a given RNG state.
pub fn generate_synthetic_bars(n: usize, rng: &mut StdRng) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
    let Some(start) = start else {
        return Vec::new();
    };

    let mut price = SYNTHETIC_BASE_PRICE;
    (0..n)
        .map(|i| {
            let open = price;
            price += standard_normal(rng) * SYNTHETIC_STEP_STD;
            let mut bar = Bar::from_close(start + Duration::hours(i as i64), price);
            bar.open = open;
            bar.high = open.max(price);
            bar.low = open.min(price);
            bar.volume = rng.gen_range(1.0..100.0);
            bar
        })
        .collect()
}

/// Box–Muller transform.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
