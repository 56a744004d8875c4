//! Recfair CLI - Popularity fairness metrics for ranked recommendations.
//!
//! # Usage
//!
//! ```bash
//! # Tail share of recommendation lists
//! recfair evaluate --input eval.json
//! recfair evaluate --input eval.json --topk 5,10 --tail-ratio 0.3
//! recfair evaluate --input eval.json --json --log-file run.jsonl
//!
//! # Group fairness tables
//! recfair groups --input groups.json
//!
//! # Show help
//! recfair --help
//! ```

mod config;
mod evaluate;
mod groups;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recfair_core::config::DEFAULT_DECIMAL_PLACE;
use recfair_core::reporting::{ExperimentLogger, JsonLinesSink};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Head prefix for evaluation scalars written to the log file
const EVAL_HEAD: &str = "eval";

/// Recfair popularity fairness CLI.
///
/// Measures how much of each recommendation list falls in the long tail
/// of item popularity, and summarizes per-group results.
#[derive(Parser)]
#[command(name = "recfair", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compute cumulative tail/head percentage metrics
    Evaluate {
        /// JSON file with `rec_items` and `count_items`
        #[arg(short, long)]
        input: PathBuf,

        /// Metric config file (default: $RECFAIR_CONFIG or platform location)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cutoffs to report, overriding the config file
        #[arg(long, value_delimiter = ',')]
        topk: Option<Vec<usize>>,

        /// Tail mass fraction, overriding the config file
        #[arg(long)]
        tail_ratio: Option<f64>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Append results as JSON lines to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Build group detail and summary tables
    Groups {
        /// JSON file with `group_eval` and optional mappings/meta
        #[arg(short, long)]
        input: PathBuf,

        /// Output tables as JSON
        #[arg(long)]
        json: bool,

        /// Append tables as JSON lines to this file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Decimal places for floating point cells
        #[arg(long, default_value_t = DEFAULT_DECIMAL_PLACE as usize)]
        precision: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, rust_log.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Evaluate {
            input,
            config: config_path,
            topk,
            tail_ratio,
            json,
            log_file,
        } => {
            let mut metric_config = config::load_metric_config(config_path.as_ref())?;
            if let Some(topk) = topk {
                metric_config.topk = topk;
            }
            if tail_ratio.is_some() {
                metric_config.tail_ratio = tail_ratio;
            }

            let report = evaluate::execute_evaluate(&input, &metric_config)?;

            if let Some(path) = log_file {
                let mut logger = open_logger(&path)?;
                logger
                    .log_eval_metrics(&report.flat_scores(), EVAL_HEAD)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            let output = if json {
                output::format_report_json(&report)
            } else {
                output::format_report_human(&report, metric_config.metric_decimal_place as usize)
            };
            println!("{}", output);
        }
        Command::Groups {
            input,
            json,
            log_file,
            precision,
        } => {
            let group_input = groups::load_group_input(&input)?;
            let (detail, summary) = groups::build_tables(&group_input);

            if let Some(path) = log_file {
                let mut logger = open_logger(&path)?;
                logger
                    .log_group_eval(
                        &group_input.group_eval,
                        group_input.group_name_mappings.as_ref(),
                        group_input.group_eval_meta.as_ref(),
                        group_input.step,
                    )
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            let output = if json {
                output::format_tables_json(&detail, &summary)
            } else {
                format!(
                    "{}\n\n{}",
                    output::format_table_human("Group results", &detail, precision),
                    output::format_table_human("Group summary", &summary, precision)
                )
            };
            println!("{}", output);
        }
    }

    Ok(())
}

/// Log filter from `RUST_LOG` when it parses, else `info` with `--verbose`
/// and `warn` without.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "info" } else { "warn" }))
}

/// Opens `path` for appending and wraps it in a JSON lines logger.
fn open_logger(path: &Path) -> Result<ExperimentLogger<JsonLinesSink<BufWriter<File>>>> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    info!("Logging results to {}", path.display());
    Ok(ExperimentLogger::new(JsonLinesSink::new(BufWriter::new(file))))
}
