//! Pass/fail evaluation
//!
//! A run passes only if all three criteria hold:
//!
//! 1. no heartbeat stall crossed the threshold,
//! 2. probe completion rate reached the configured floor,
//! 3. probe p95 latency stayed within the ceiling.
//!
//! Every failed criterion contributes a reason, in that order. Evaluation is a
//! pure function of its inputs and never fails; adapter errors only show up
//! as a lower completion rate.

use super::metrics::{aggregate, Baseline, RunMetrics, StallSummary, TaskCounts};
use crate::domain::{ConfigError, Millis, RunConfig};
use crate::engine::RunOutcome;
use std::time::Duration;

/// Every probe must complete by default
pub const DEFAULT_MIN_COMPLETION_RATE: f64 = 1.0;

/// Generous bound for a single lightweight I/O operation
pub const DEFAULT_P95_CEILING: Duration = Duration::from_secs(1);

/// Upper bound for probe p95 latency
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum P95Ceiling {
    /// Fixed limit
    Absolute(Duration),
    /// `multiple` × baseline p95, or `fallback` when no baseline p95 exists
    BaselineMultiple { multiple: f64, fallback: Duration },
}

impl P95Ceiling {
    /// The limit that applies for this baseline
    #[must_use]
    pub fn resolve(&self, baseline: Option<&Baseline>) -> Duration {
        match *self {
            P95Ceiling::Absolute(limit) => limit,
            P95Ceiling::BaselineMultiple { multiple, fallback } => {
                match baseline.and_then(|b| b.p95) {
                    Some(p95) => Duration::try_from_secs_f64(p95.as_secs_f64() * multiple)
                        .unwrap_or(Duration::MAX),
                    None => fallback,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationPolicy {
    /// Minimum acceptable `completed probes / total probes`
    pub min_completion_rate: f64,
    pub p95_ceiling: P95Ceiling,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            min_completion_rate: DEFAULT_MIN_COMPLETION_RATE,
            p95_ceiling: P95Ceiling::Absolute(DEFAULT_P95_CEILING),
        }
    }
}

impl EvaluationPolicy {
    /// # Errors
    /// Returns a [`ConfigError`] for a floor outside `0..=1` or a non-positive multiple
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_completion_rate) {
            return Err(ConfigError::InvalidCompletionFloor(self.min_completion_rate));
        }
        match self.p95_ceiling {
            P95Ceiling::Absolute(limit) if limit.is_zero() => {
                Err(ConfigError::ZeroDuration { name: "p95 ceiling" })
            }
            P95Ceiling::BaselineMultiple { multiple, .. }
                if !multiple.is_finite() || multiple <= 0.0 =>
            {
                Err(ConfigError::InvalidBaselineMultiple(multiple))
            }
            P95Ceiling::BaselineMultiple { fallback, .. } if fallback.is_zero() => {
                Err(ConfigError::ZeroDuration { name: "p95 ceiling" })
            }
            _ => Ok(()),
        }
    }
}

/// Final result of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub throughput: f64,
    pub p50: Option<Duration>,
    pub p95: Option<Duration>,
    /// The ceiling p95 was judged against
    pub p95_ceiling: Duration,
    pub stall_count: usize,
    pub stall_durations: Vec<Duration>,
    pub max_stall: Option<Duration>,
    pub completion_rate: f64,
    pub collapsed: bool,
    pub counts: TaskCounts,
    pub duration: Duration,
    pub passed: bool,
    /// One entry per failed criterion, empty when passed
    pub reasons: Vec<String>,
}

/// Apply the policy to aggregated metrics and stalls
#[must_use]
pub fn evaluate(
    metrics: &RunMetrics,
    stalls: &StallSummary,
    policy: &EvaluationPolicy,
    baseline: Option<&Baseline>,
) -> Verdict {
    let mut reasons = Vec::new();

    if stalls.count() > 0 {
        let max = stalls.max.unwrap_or_default();
        reasons.push(format!(
            "{} event loop stall(s) detected, longest {}",
            stalls.count(),
            Millis(max)
        ));
    }

    if metrics.completion_rate < policy.min_completion_rate {
        reasons.push(format!(
            "completion rate {:.1}% below required {:.1}% ({} of {} probes completed)",
            metrics.completion_rate * 100.0,
            policy.min_completion_rate * 100.0,
            metrics.probes_completed,
            metrics.probes_total
        ));
    }

    let ceiling = policy.p95_ceiling.resolve(baseline);
    match metrics.p95 {
        Some(p95) if p95 > ceiling => {
            reasons.push(format!("p95 latency {} exceeds ceiling {}", Millis(p95), Millis(ceiling)));
        }
        Some(_) => {}
        None => reasons.push("no probe completed, p95 latency unavailable".to_string()),
    }

    Verdict {
        throughput: metrics.throughput,
        p50: metrics.p50,
        p95: metrics.p95,
        p95_ceiling: ceiling,
        stall_count: stalls.count(),
        stall_durations: stalls.durations.clone(),
        max_stall: stalls.max,
        completion_rate: metrics.completion_rate,
        collapsed: metrics.collapsed,
        counts: metrics.counts,
        duration: metrics.duration,
        passed: reasons.is_empty(),
        reasons,
    }
}

/// Aggregate a run and evaluate it in one step
#[must_use]
pub fn judge(
    outcome: &RunOutcome,
    config: &RunConfig,
    policy: &EvaluationPolicy,
    baseline: Option<&Baseline>,
) -> Verdict {
    let metrics = aggregate(outcome, baseline);
    let stalls = StallSummary::from_samples(&outcome.samples, config.stall_threshold);
    evaluate(&metrics, &stalls, policy, baseline)
}
