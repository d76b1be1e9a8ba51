//! CLI argument definitions

// Durations are parsed through f64 and checked against u64::MAX first
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use crate::analysis::evaluator::DEFAULT_MIN_COMPLETION_RATE;
use crate::analysis::{EvaluationPolicy, P95Ceiling};
use crate::domain::config::{DEFAULT_GRACE_PERIOD, DEFAULT_TASKS};
use crate::domain::RunConfig;
use crate::engine::Calibration;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "stallscope",
    version,
    about = "Detect async I/O libraries that block the event loop",
    after_help = "\
EXAMPLES:
    stallscope list                                   Show available adapters
    stallscope detect tokio-fs                        Run with default settings
    stallscope detect std-fs --tasks 200 --timeout 10s
    stallscope detect csv-async --baseline --p95-baseline-multiple 5 --output report.json"
)]
pub struct Args {
    /// Log engine progress at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered adapters
    List,
    /// Run the detector against one adapter
    Detect(DetectArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct DetectArgs {
    /// Adapter name, as shown by `list`
    #[arg(value_name = "ADAPTER")]
    pub adapter: String,

    /// Concurrent tasks to launch
    #[arg(long, default_value_t = DEFAULT_TASKS)]
    pub tasks: usize,

    /// How many of those tasks run the adapter's blocking operation
    #[arg(long, default_value_t = 1)]
    pub blocking_tasks: usize,

    /// Global deadline for all tasks (e.g. 30s, 500ms)
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Heartbeat gap that counts as a stall
    #[arg(long, default_value = "10ms", value_parser = parse_duration)]
    pub stall_threshold: Duration,

    /// Heartbeat cadence, must be shorter than the stall threshold
    #[arg(long, default_value = "1ms", value_parser = parse_duration)]
    pub heartbeat_interval: Duration,

    /// Minimum fraction of probes that must complete (0.0 - 1.0)
    #[arg(long, default_value_t = DEFAULT_MIN_COMPLETION_RATE)]
    pub min_completion: f64,

    /// Absolute p95 latency ceiling, or the fallback when no baseline p95 exists
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub p95_ceiling: Duration,

    /// Judge p95 against this multiple of the baseline p95 instead
    #[arg(long, value_name = "X", requires = "baseline")]
    pub p95_baseline_multiple: Option<f64>,

    /// Measure uncontended probes first and compare against them
    #[arg(long)]
    pub baseline: bool,

    /// Write the verdict as JSON
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl DetectArgs {
    #[must_use]
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            task_count: self.tasks,
            blocking_task_count: self.blocking_tasks,
            timeout: self.timeout,
            stall_threshold: self.stall_threshold,
            heartbeat_interval: self.heartbeat_interval,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    #[must_use]
    pub fn policy(&self) -> EvaluationPolicy {
        let p95_ceiling = match self.p95_baseline_multiple {
            Some(multiple) => P95Ceiling::BaselineMultiple { multiple, fallback: self.p95_ceiling },
            None => P95Ceiling::Absolute(self.p95_ceiling),
        };
        EvaluationPolicy { min_completion_rate: self.min_completion, p95_ceiling }
    }

    #[must_use]
    pub fn calibration(&self) -> Calibration {
        if self.baseline {
            Calibration::Uncontended
        } else {
            Calibration::Skip
        }
    }
}

/// Parse `250us`, `500ms`, `5s` or a bare number of seconds
///
/// # Errors
/// Returns a message for empty, negative, non-numeric or overflowing input
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    let (number, nanos_per_unit) =
        if let Some(n) = s.strip_suffix("us").or_else(|| s.strip_suffix("µs")) {
            (n, 1e3)
        } else if let Some(n) = s.strip_suffix("ms") {
            (n, 1e6)
        } else if let Some(n) = s.strip_suffix('s') {
            (n, 1e9)
        } else {
            (s, 1e9)
        };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{input}' (expected e.g. 250us, 500ms, 5s)"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid duration '{input}': must be a non-negative number"));
    }
    let nanos = (value * nanos_per_unit).round();
    if nanos >= u64::MAX as f64 {
        return Err(format!("invalid duration '{input}': too large"));
    }
    Ok(Duration::from_nanos(nanos as u64))
}
