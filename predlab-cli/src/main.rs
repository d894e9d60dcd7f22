//! PredLab CLI: run, sweep, and inspect confidence-gated backtests.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file plus overrides
//! - `sweep`: replay one dataset across several confidence thresholds
//! - `show`: print the summary of a saved results file

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use predlab_runner::export::{format_summary, format_sweep_table, load_results, ResultsFile};
use predlab_runner::runner::{prepare_data, run_single_backtest, PredictionOrigin, RunReport};
use predlab_runner::sweep::{default_thresholds, ThresholdSweep};
use predlab_runner::{save_artifacts, BacktestConfig, DataSource};

#[derive(Parser)]
#[command(
    name = "predlab",
    about = "PredLab CLI: confidence-gated directional backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a single backtest.
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Predictions CSV (direction,confidence). Defaults to the SMA/RSI heuristic.
        #[arg(long)]
        predictions: Option<PathBuf>,

        /// Inclusive confidence threshold.
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Fixed amount risked per trade.
        #[arg(long)]
        stake: Option<f64>,

        /// Starting account balance.
        #[arg(long)]
        initial_balance: Option<f64>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary only; write nothing to disk.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,
    },
    /// Run the same data across several confidence thresholds.
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        /// Predictions CSV (direction,confidence). Defaults to the SMA/RSI heuristic.
        #[arg(long)]
        predictions: Option<PathBuf>,

        /// Comma-separated thresholds. Defaults to 0.50..=0.90 in 0.05 steps.
        #[arg(long, value_delimiter = ',')]
        thresholds: Vec<f64>,

        /// Run thresholds one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Print the summary of a saved results file or artifact directory.
    Show {
        /// Path to results.json or the directory containing it.
        path: PathBuf,

        /// Print the Markdown report instead of the plain summary.
        #[arg(long, default_value_t = false)]
        markdown: bool,
    },
}

/// Data selection shared by `run` and `sweep`.
#[derive(Args)]
struct DataArgs {
    /// Path to a TOML config file. Omitted means all defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bars CSV. Overrides `data.bars_path`.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Keep at most this many rows of the bars file.
    #[arg(long)]
    max_rows: Option<usize>,

    /// Ignore any bars file and generate a synthetic random walk.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Seed for synthetic bars and the heuristic predictor.
    #[arg(long)]
    seed: Option<u64>,
}

impl DataArgs {
    fn load_config(&self, predictions: Option<PathBuf>) -> Result<BacktestConfig> {
        let mut config = match &self.config {
            Some(path) => BacktestConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => BacktestConfig::default(),
        };
        if let Some(path) = &self.data {
            config.data.bars_path = Some(path.clone());
        }
        if self.max_rows.is_some() {
            config.data.max_rows = self.max_rows;
        }
        if self.synthetic {
            config.data.synthetic = true;
        }
        if let Some(seed) = self.seed {
            config.data.seed = seed;
        }
        if predictions.is_some() {
            config.data.predictions_path = predictions;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            predictions,
            min_confidence,
            stake,
            initial_balance,
            output_dir,
            no_artifacts,
        } => {
            let mut config = data.load_config(predictions)?;
            if let Some(t) = min_confidence {
                config.backtest.min_confidence = t;
            }
            if let Some(s) = stake {
                config.backtest.stake = s;
            }
            if let Some(b) = initial_balance {
                config.backtest.initial_balance = b;
            }
            let output_dir = (!no_artifacts).then_some(output_dir);
            run_backtest_cmd(&config, output_dir.as_deref())
        }
        Commands::Sweep {
            data,
            predictions,
            thresholds,
            sequential,
        } => {
            let config = data.load_config(predictions)?;
            run_sweep_cmd(&config, thresholds, sequential)
        }
        Commands::Show { path, markdown } => run_show_cmd(&path, markdown),
    }
}

fn run_backtest_cmd(config: &BacktestConfig, output_dir: Option<&Path>) -> Result<()> {
    let report = run_single_backtest(config).context("backtest failed")?;
    print_provenance(&report);

    let file = ResultsFile::from_report(&report);
    println!();
    print!("{}", format_summary(&file));

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, dir)?;
        println!();
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_sweep_cmd(config: &BacktestConfig, thresholds: Vec<f64>, sequential: bool) -> Result<()> {
    let thresholds = if thresholds.is_empty() {
        default_thresholds()
    } else {
        thresholds
    };

    let prepared = prepare_data(config).context("failed to prepare sweep data")?;
    if prepared.source.is_synthetic() {
        println!("WARNING: Results based on SYNTHETIC data");
    }

    let results = ThresholdSweep::new(config.engine_config())
        .with_parallelism(!sequential)
        .run(&prepared.series, &thresholds)
        .context("sweep failed")?;

    println!();
    print!("{}", format_sweep_table(&results));
    Ok(())
}

fn run_show_cmd(path: &Path, markdown: bool) -> Result<()> {
    let file = load_results(path)?;

    let recomputed = file.recompute_metrics();
    if recomputed != file.metrics {
        tracing::warn!("stored metrics differ from metrics recomputed from the trade ledger");
    }

    if markdown {
        print!("{}", predlab_runner::export::generate_report(&file));
    } else {
        if !file.run_id.is_empty() {
            println!("Run: {}", file.run_id);
        }
        print!("{}", format_summary(&file));
    }
    Ok(())
}

fn print_provenance(report: &RunReport) {
    println!("Run:            {}", report.run_id);
    match &report.source {
        DataSource::Csv { path } => println!("Data:           {}", path.display()),
        DataSource::Synthetic { seed } => {
            println!("Data:           synthetic (seed {seed})");
            println!("WARNING: Results based on SYNTHETIC data");
        }
    }
    match &report.predictions {
        PredictionOrigin::File { path } => println!("Predictions:    {}", path.display()),
        PredictionOrigin::Heuristic {
            fast_sma,
            slow_sma,
            rsi_period,
        } => println!("Predictions:    SMA {fast_sma}/{slow_sma}, RSI {rsi_period} heuristic"),
    }
    let d = report.result.diagnostics();
    println!(
        "Steps:          {} evaluated, {} below threshold, {} missing close",
        d.evaluated, d.skipped_low_confidence, d.skipped_missing_close
    );
    if report.duplicates_dropped > 0 {
        println!(
            "WARNING: {} duplicate timestamps dropped",
            report.duplicates_dropped
        );
    }
}
