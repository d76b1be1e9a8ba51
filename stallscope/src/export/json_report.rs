// Durations are reported as fractional milliseconds
#![allow(clippy::cast_precision_loss)]

use crate::domain::{ExportError, Millis};
use crate::engine::Detection;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Run configuration as it appears in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfiguration {
    pub tasks: usize,
    pub blocking_tasks: usize,
    pub timeout_ms: f64,
    pub stall_threshold_ms: f64,
    pub heartbeat_interval_ms: f64,
    pub min_completion_rate: f64,
    /// Ceiling p95 was judged against, after resolving any baseline multiple
    pub p95_ceiling_ms: f64,
    pub baseline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub completed: usize,
    pub timed_out: usize,
    pub failed: usize,
}

/// Machine-readable verdict written by `detect --output`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub adapter: String,
    pub configuration: ReportConfiguration,
    /// Completed probes per second
    pub throughput: f64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub stall_count: usize,
    pub stall_durations_ms: Vec<f64>,
    pub completion_rate: f64,
    pub collapsed: bool,
    pub passed: bool,
    pub reasons: Vec<String>,
    pub duration_ms: f64,
    pub counts: ReportCounts,
}

impl JsonReport {
    #[must_use]
    pub fn from_detection(detection: &Detection) -> Self {
        let config = &detection.config;
        let verdict = &detection.verdict;
        let ms = |d| Millis(d).as_f64();

        Self {
            adapter: detection.adapter.to_string(),
            configuration: ReportConfiguration {
                tasks: config.task_count,
                blocking_tasks: config.blocking_task_count,
                timeout_ms: ms(config.timeout),
                stall_threshold_ms: ms(config.stall_threshold),
                heartbeat_interval_ms: ms(config.heartbeat_interval),
                min_completion_rate: detection.policy.min_completion_rate,
                p95_ceiling_ms: ms(verdict.p95_ceiling),
                baseline: detection.baseline.is_some(),
            },
            throughput: verdict.throughput,
            p50_ms: verdict.p50.map(ms),
            p95_ms: verdict.p95.map(ms),
            stall_count: verdict.stall_count,
            stall_durations_ms: verdict.stall_durations.iter().copied().map(ms).collect(),
            completion_rate: verdict.completion_rate,
            collapsed: verdict.collapsed,
            passed: verdict.passed,
            reasons: verdict.reasons.clone(),
            duration_ms: ms(verdict.duration),
            counts: ReportCounts {
                completed: verdict.counts.completed,
                timed_out: verdict.counts.timed_out,
                failed: verdict.counts.failed,
            },
        }
    }

    /// Write the report as pretty JSON to any writer
    ///
    /// # Errors
    /// Returns [`ExportError::Json`] if serialization or the underlying write fails
    pub fn export<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Write the report for `detection` to `path`, replacing any existing file
///
/// # Errors
/// Returns [`ExportError::WriteFailed`] if the file cannot be created or flushed
pub fn write_report(path: &Path, detection: &Detection) -> Result<(), ExportError> {
    let failed = |source| ExportError::WriteFailed { path: path.display().to_string(), source };

    let file = File::create(path).map_err(failed)?;
    let mut writer = BufWriter::new(file);
    JsonReport::from_detection(detection).export(&mut writer)?;
    writer.write_all(b"\n").map_err(failed)?;
    writer.flush().map_err(failed)?;
    Ok(())
}
