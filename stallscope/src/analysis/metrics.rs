//! Latency and throughput aggregation
//!
//! Turns the task records of a finished run into rates and percentiles.
//!
//! # Percentile policy
//!
//! Percentiles use **nearest-rank** selection over the sorted probe latencies:
//! the p-th percentile of `n` values is the value at 1-based rank `⌈p·n/100⌉`.
//! No interpolation, so every reported percentile is a latency that was
//! actually observed, and the same records always give the same answer.
//!
//! # Accounting policy
//!
//! Only probe tasks feed throughput, percentiles and completion rate. Blocking
//! tasks exist to create contention; they are counted in the per-status totals
//! and nowhere else, whether they finish, fail or time out.

// Rate calculations intentionally convert counts to f64
#![allow(clippy::cast_precision_loss)]

use crate::domain::{TaskKind, TaskStatus};
use crate::engine::{RunOutcome, Sample};
use std::time::Duration;

/// With a baseline, completion below this fraction of the baseline rate is a collapse
pub const COLLAPSE_BASELINE_RATIO: f64 = 0.9;

/// Without a baseline, completion below this rate is a collapse
pub const COLLAPSE_ABSOLUTE_FLOOR: f64 = 0.5;

/// Per-status totals over every task, probes and blocking alike
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub completed: usize,
    pub timed_out: usize,
    pub failed: usize,
}

impl TaskCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed + self.timed_out + self.failed
    }

    fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::TimedOut => self.timed_out += 1,
            TaskStatus::Failed => self.failed += 1,
        }
    }
}

/// Reference figures from an uncontended run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub completion_rate: f64,
    pub p95: Option<Duration>,
}

impl Baseline {
    #[must_use]
    pub fn from_metrics(metrics: &RunMetrics) -> Self {
        Self { completion_rate: metrics.completion_rate, p95: metrics.p95 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunMetrics {
    /// Completed probes per second of run time
    pub throughput: f64,
    pub p50: Option<Duration>,
    pub p95: Option<Duration>,
    pub probes_total: usize,
    pub probes_completed: usize,
    /// `probes_completed / probes_total`
    pub completion_rate: f64,
    /// Completion fell relative to the baseline, or below the absolute floor
    pub collapsed: bool,
    pub counts: TaskCounts,
    pub duration: Duration,
}

/// Heartbeat gaps that crossed the stall threshold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StallSummary {
    /// Gap of every stall, in the order they happened
    pub durations: Vec<Duration>,
    pub max: Option<Duration>,
}

impl StallSummary {
    #[must_use]
    pub fn from_samples(samples: &[Sample], threshold: Duration) -> Self {
        let durations: Vec<Duration> =
            crate::engine::heartbeat::stalls(samples, threshold).map(|s| s.gap).collect();
        let max = durations.iter().max().copied();
        Self { durations, max }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.durations.len()
    }
}

/// Nearest-rank percentile of an ascending slice
///
/// `percentile` is clamped to `1..=100`. Returns `None` for an empty slice.
#[must_use]
pub fn nearest_rank(sorted: &[Duration], percentile: u32) -> Option<Duration> {
    if sorted.is_empty() {
        return None;
    }
    let p = percentile.clamp(1, 100) as usize;
    let rank = (sorted.len() * p).div_ceil(100).max(1);
    sorted.get(rank - 1).copied()
}

/// Whether a completion rate counts as a collapse
#[must_use]
pub fn is_collapse(completion_rate: f64, baseline: Option<&Baseline>) -> bool {
    match baseline {
        Some(base) => completion_rate < base.completion_rate * COLLAPSE_BASELINE_RATIO,
        None => completion_rate < COLLAPSE_ABSOLUTE_FLOOR,
    }
}

/// Aggregate a finished run
#[must_use]
pub fn aggregate(outcome: &RunOutcome, baseline: Option<&Baseline>) -> RunMetrics {
    let mut counts = TaskCounts::default();
    for record in &outcome.records {
        counts.record(record.status);
    }

    let mut latencies: Vec<Duration> = outcome
        .of_kind(TaskKind::Probe)
        .filter(|r| r.status == TaskStatus::Completed)
        .filter_map(|r| r.latency())
        .collect();
    latencies.sort_unstable();

    let probes_total = outcome.of_kind(TaskKind::Probe).count();
    let probes_completed = latencies.len();

    let completion_rate =
        if probes_total == 0 { 0.0 } else { probes_completed as f64 / probes_total as f64 };

    let secs = outcome.duration.as_secs_f64();
    let throughput = if secs > 0.0 { probes_completed as f64 / secs } else { 0.0 };

    RunMetrics {
        throughput,
        p50: nearest_rank(&latencies, 50),
        p95: nearest_rank(&latencies, 95),
        probes_total,
        probes_completed,
        completion_rate,
        collapsed: is_collapse(completion_rate, baseline),
        counts,
        duration: outcome.duration,
    }
}
