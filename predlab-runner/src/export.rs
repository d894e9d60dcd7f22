//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! A run is persisted as a results file (`results.json`) holding metrics,
//! trade ledger, equity curve and the parameters the run was started with,
//! plus CSV copies of the two ledgers and a Markdown report.
//!
//! Results files carry a `schema_version`. Files written by a newer version
//! are rejected on load; files without one are read as version 1. Version 1
//! files may also lack trade indices, use naive `YYYY-MM-DD HH:MM:SS`
//! timestamps, or store `"metrics": {}` for a run without trades; the
//! missing pieces are rebuilt from the ledger.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use predlab_core::domain::{EquitySample, Trade};
use predlab_core::engine::{BacktestResult, PayoffPolicy, ReplayDiagnostics, RunParameters};

use crate::config::RunId;
use crate::data_loader::DataSource;
use crate::metrics::PerformanceMetrics;
use crate::runner::{PredictionOrigin, RunReport, SCHEMA_VERSION};
use crate::sweep::SweepResults;

/// Name of the results file inside an artifact directory.
pub const RESULTS_FILE: &str = "results.json";

/// Length of the run-id prefix used as the artifact directory name.
const RUN_DIR_ID_LEN: usize = 12;

fn default_schema_version() -> u32 {
    1
}

/// On-disk form of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredResults")]
pub struct ResultsFile {
    pub schema_version: u32,
    pub run_id: RunId,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquitySample>,
    pub parameters: RunParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DataSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictions: Option<PredictionOrigin>,
    pub diagnostics: ReplayDiagnostics,
}

/// A metrics object as read back: complete, or empty for a run without trades.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredMetrics {
    Full(PerformanceMetrics),
    Empty {},
}

/// Everything a results file may contain, with the optional parts of older
/// files defaulted.
#[derive(Deserialize)]
struct StoredResults {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default)]
    run_id: RunId,
    #[serde(default)]
    metrics: Option<StoredMetrics>,
    trades: Vec<Trade>,
    equity_curve: Vec<EquitySample>,
    parameters: RunParameters,
    #[serde(default)]
    source: Option<DataSource>,
    #[serde(default)]
    predictions: Option<PredictionOrigin>,
    #[serde(default)]
    diagnostics: ReplayDiagnostics,
}

impl From<StoredResults> for ResultsFile {
    fn from(stored: StoredResults) -> Self {
        let mut trades = stored.trades;
        // Index-less trades pair one-to-one with the equity samples.
        if trades.len() == stored.equity_curve.len() && trades.iter().all(|t| t.index == 0) {
            for (trade, sample) in trades.iter_mut().zip(&stored.equity_curve) {
                trade.index = sample.index;
            }
        }
        let metrics = match stored.metrics {
            Some(StoredMetrics::Full(m)) => m,
            Some(StoredMetrics::Empty {}) | None => PerformanceMetrics::compute(
                &BacktestResult::from_ledger(
                    trades.clone(),
                    stored.equity_curve.clone(),
                    stored.parameters,
                ),
            ),
        };
        Self {
            schema_version: stored.schema_version,
            run_id: stored.run_id,
            metrics,
            trades,
            equity_curve: stored.equity_curve,
            parameters: stored.parameters,
            source: stored.source,
            predictions: stored.predictions,
            diagnostics: stored.diagnostics,
        }
    }
}

impl ResultsFile {
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: report.run_id.clone(),
            metrics: report.metrics.clone(),
            trades: report.result.trades().to_vec(),
            equity_curve: report.result.equity_curve().to_vec(),
            parameters: *report.result.parameters(),
            source: Some(report.source.clone()),
            predictions: Some(report.predictions.clone()),
            diagnostics: *report.result.diagnostics(),
        }
    }

    /// Rebuild the engine result from the stored ledger.
    pub fn to_result(&self) -> BacktestResult {
        BacktestResult::from_ledger(
            self.trades.clone(),
            self.equity_curve.clone(),
            self.parameters,
        )
    }

    /// Metrics recomputed from the stored ledger rather than read back.
    pub fn recompute_metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics::compute(&self.to_result())
    }
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a run to pretty JSON.
pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(&ResultsFile::from_report(report))
        .context("failed to serialize results to JSON")
}

/// Deserialize a results file, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ResultsFile> {
    let file: ResultsFile =
        serde_json::from_str(json).context("failed to deserialize results from JSON")?;
    if file.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            file.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(file)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade ledger as CSV.
///
/// Columns: index, timestamp, entry_price, exit_price, direction, confidence,
/// actual_direction, result, profit, balance
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for t in trades {
        wtr.serialize(t)
            .with_context(|| format!("failed to write trade at bar {}", t.index))?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the equity curve as CSV with index, timestamp and balance columns.
pub fn export_equity_csv(equity_curve: &[EquitySample]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "timestamp", "balance"])?;
    for s in equity_curve {
        wtr.write_record([
            &s.index.to_string(),
            &s.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            &format!("{:.2}", s.balance),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates `{run_id prefix}/` under `output_dir` containing:
/// - `results.json`: metrics, ledgers and parameters
/// - `trades.csv`: trade ledger
/// - `equity.csv`: equity curve
/// - `report.md`: Markdown report
///
/// Identical configs map to the same directory; a rerun overwrites it.
/// Returns the path to the directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname: String = report.run_id.chars().take(RUN_DIR_ID_LEN).collect();
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let file = ResultsFile::from_report(report);

    let json = serde_json::to_string_pretty(&file).context("failed to serialize results")?;
    write_artifact(&run_dir, RESULTS_FILE, &json)?;
    write_artifact(&run_dir, "trades.csv", &export_trades_csv(&file.trades)?)?;
    write_artifact(&run_dir, "equity.csv", &export_equity_csv(&file.equity_curve)?)?;
    write_artifact(&run_dir, "report.md", &generate_report(&file))?;

    tracing::info!(dir = %run_dir.display(), "saved artifacts");
    Ok(run_dir)
}

fn write_artifact(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Load a results file. `path` may be the file itself or an artifact
/// directory containing `results.json`.
pub fn load_results(path: &Path) -> Result<ResultsFile> {
    let file_path = if path.is_dir() {
        path.join(RESULTS_FILE)
    } else {
        path.to_path_buf()
    };
    let json = std::fs::read_to_string(&file_path)
        .with_context(|| format!("failed to read {}", file_path.display()))?;
    import_json(&json).with_context(|| format!("invalid results file {}", file_path.display()))
}

// ─── Text and Markdown reports ──────────────────────────────────────

/// Plain-text summary, one metric per line.
pub fn format_summary(file: &ResultsFile) -> String {
    let m = &file.metrics;
    let p = &file.parameters;
    let mut out = String::with_capacity(512);
    out.push_str("BACKTEST RESULTS\n");
    out.push_str(&"=".repeat(40));
    out.push('\n');
    let _ = writeln!(out, "Initial balance:      ${:.2}", p.initial_balance);
    let _ = writeln!(out, "Final balance:        ${:.2}", m.final_balance);
    let _ = writeln!(out, "Total profit:         ${:.2}", m.total_profit);
    let _ = writeln!(out, "Total return:         {:.2}%", m.total_return);
    let _ = writeln!(out, "Total trades:         {}", m.total_trades);
    let _ = writeln!(out, "Winning trades:       {}", m.winning_trades);
    let _ = writeln!(out, "Losing trades:        {}", m.losing_trades);
    let _ = writeln!(out, "Win rate:             {:.2}%", m.win_rate * 100.0);
    let _ = writeln!(out, "Avg profit per trade: ${:.2}", m.avg_profit_per_trade);
    let _ = writeln!(out, "Max drawdown:         {:.2}%", m.max_drawdown);
    let _ = writeln!(out, "Sharpe ratio:         {:.3}", m.sharpe_ratio);
    out
}

/// Generate a Markdown report for a single run.
pub fn generate_report(file: &ResultsFile) -> String {
    let mut md = String::with_capacity(2048);
    let p = &file.parameters;

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Parameters\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    if !file.run_id.is_empty() {
        md.push_str(&format!("| Run ID | {} |\n", file.run_id));
    }
    md.push_str(&format!("| Initial Balance | ${:.2} |\n", p.initial_balance));
    md.push_str(&format!("| Stake | ${:.2} |\n", p.stake));
    md.push_str(&format!("| Min Confidence | {:.2} |\n", p.min_confidence));
    md.push_str(&format!(
        "| Payoff | +{:.0}% win / -{:.0}% loss |\n",
        p.win_payout * 100.0,
        p.loss_fraction * 100.0
    ));
    match &file.source {
        Some(DataSource::Csv { path }) => {
            md.push_str(&format!("| Data | {} |\n", path.display()));
        }
        Some(DataSource::Synthetic { seed }) => {
            md.push_str(&format!("| Data | **SYNTHETIC** (seed {seed}) |\n"));
        }
        None => {}
    }
    match &file.predictions {
        Some(PredictionOrigin::File { path }) => {
            md.push_str(&format!("| Predictions | {} |\n", path.display()));
        }
        Some(PredictionOrigin::Heuristic {
            fast_sma,
            slow_sma,
            rsi_period,
        }) => {
            md.push_str(&format!(
                "| Predictions | SMA {fast_sma}/{slow_sma}, RSI {rsi_period} |\n"
            ));
        }
        None => {}
    }
    md.push('\n');

    let m = &file.metrics;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Final Balance | ${:.2} |\n", m.final_balance));
    md.push_str(&format!("| Total Profit | ${:.2} |\n", m.total_profit));
    md.push_str(&format!("| Total Return | {:.2}% |\n", m.total_return));
    md.push_str(&format!("| Trades | {} |\n", m.total_trades));
    md.push_str(&format!(
        "| Wins / Losses | {} / {} |\n",
        m.winning_trades, m.losing_trades
    ));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", m.win_rate * 100.0));
    let breakeven = PayoffPolicy::new(p.win_payout, p.loss_fraction).breakeven_win_rate();
    md.push_str(&format!("| Break-even Win Rate | {:.1}% |\n", breakeven * 100.0));
    md.push_str(&format!(
        "| Avg Profit / Trade | ${:.2} |\n",
        m.avg_profit_per_trade
    ));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe_ratio));
    md.push('\n');

    let d = &file.diagnostics;
    if d.evaluated > 0 {
        md.push_str("## Replay Diagnostics\n\n");
        md.push_str("| Counter | Value |\n");
        md.push_str("| --- | --- |\n");
        md.push_str(&format!("| Bars | {} |\n", d.bars));
        md.push_str(&format!("| Evaluated | {} |\n", d.evaluated));
        md.push_str(&format!(
            "| Skipped (low confidence) | {} |\n",
            d.skipped_low_confidence
        ));
        md.push_str(&format!(
            "| Skipped (missing close) | {} |\n",
            d.skipped_missing_close
        ));
        md.push('\n');
    }

    md
}

/// Text table of a threshold sweep, one row per threshold.
pub fn format_sweep_table(results: &SweepResults) -> String {
    let mut out = String::with_capacity(128 + results.len() * 64);
    let _ = writeln!(
        out,
        "{:>9} {:>7} {:>9} {:>12} {:>9} {:>8}",
        "min_conf", "trades", "win_rate", "profit", "max_dd", "sharpe"
    );
    for point in results.points() {
        let m = &point.metrics;
        let _ = writeln!(
            out,
            "{:>9.2} {:>7} {:>8.1}% {:>12.2} {:>8.2}% {:>8.3}",
            point.min_confidence,
            m.total_trades,
            m.win_rate * 100.0,
            m.total_profit,
            m.max_drawdown,
            m.sharpe_ratio
        );
    }
    if let Some(best) = results.best() {
        let _ = writeln!(
            out,
            "best: min_confidence {:.2} (profit {:.2})",
            best.min_confidence, best.metrics.total_profit
        );
    }
    out
}
