//! # Detector Engine
//!
//! Runs one detection end to end:
//!
//! ```text
//! RunConfig ──▶ workload::generate ──▶ harness::run ──▶ analysis::judge ──▶ Verdict
//!                                        │     ▲
//!                                        ▼     │
//!                                     heartbeat (same runtime)
//! ```
//!
//! The engine keeps no state between calls. The adapter registry is passed in
//! by the caller, and everything created for a run is dropped once the
//! [`Detection`] is returned.

pub mod harness;
pub mod heartbeat;
pub mod workload;

pub use harness::{Leftovers, RunOutcome, TaskRecord};
pub use heartbeat::Sample;
pub use workload::TaskSpec;

use crate::adapters::AdapterRegistry;
use crate::analysis::{aggregate, judge, Baseline, EvaluationPolicy, Verdict};
use crate::domain::{DetectorError, RunConfig, TaskStatus};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};

/// Upper bound on the runtime's blocking pool
pub const BLOCKING_POOL_THREADS: usize = 64;

/// Whether to measure an uncontended baseline before the real run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Calibration {
    #[default]
    Skip,
    /// Run the probes alone first and judge the contended run against them
    Uncontended,
}

/// Everything a reporter needs about one detection
#[derive(Debug, Clone)]
pub struct Detection {
    pub adapter: &'static str,
    pub config: RunConfig,
    pub policy: EvaluationPolicy,
    pub baseline: Option<Baseline>,
    pub outcome: RunOutcome,
    pub verdict: Verdict,
}

/// Build the current-thread runtime detections run on
///
/// The blocking pool is capped. Pool threads are spawned by the thread that
/// calls `spawn_blocking`, so an uncapped first wave of offloaded calls stalls
/// the scheduler on thread creation.
///
/// # Errors
/// Returns the I/O error if the runtime's drivers cannot be created
pub fn runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .max_blocking_threads(BLOCKING_POOL_THREADS)
        .build()
}

fn ensure_shared_scheduler() -> Result<(), DetectorError> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::CurrentThread => Ok(()),
        _ => Err(DetectorError::SharedRuntimeRequired),
    }
}

/// Run the detector against the named adapter.
///
/// Must be awaited on a current-thread Tokio runtime: the heartbeat only
/// catches stalls if it competes with the adapter for the same thread.
///
/// # Errors
/// Fails before launching anything if the configuration or policy is invalid,
/// the adapter is unknown, or the runtime is multi-threaded. Once tasks are
/// launched, every outcome is folded into the returned [`Detection`].
pub async fn detect(
    registry: &AdapterRegistry,
    adapter_name: &str,
    config: &RunConfig,
    policy: &EvaluationPolicy,
    calibration: Calibration,
) -> Result<Detection, DetectorError> {
    config.validate()?;
    policy.validate()?;
    let adapter = registry.get(adapter_name)?;
    let tasks = workload::generate(config)?;
    ensure_shared_scheduler()?;

    let baseline = match calibration {
        Calibration::Skip => None,
        Calibration::Uncontended => {
            info!("{}: calibrating with {} uncontended probes", adapter.name(), config.probe_count());
            // Late calibration work must not run into the contended run
            let probes = workload::baseline(config);
            let outcome =
                harness::run_with(Arc::clone(&adapter), &probes, config, Leftovers::Settle).await;
            let baseline = Baseline::from_metrics(&aggregate(&outcome, None));
            info!(
                "{}: baseline completion {:.1}%, p95 {:?}",
                adapter.name(),
                baseline.completion_rate * 100.0,
                baseline.p95
            );
            Some(baseline)
        }
    };

    info!(
        "{}: launching {} tasks ({} blocking), timeout {:?}",
        adapter.name(),
        config.task_count,
        config.blocking_task_count,
        config.timeout
    );
    let outcome = harness::run(Arc::clone(&adapter), &tasks, config).await;

    let failed = outcome.count(TaskStatus::Failed);
    let timed_out = outcome.count(TaskStatus::TimedOut);
    if failed > 0 || timed_out > 0 {
        warn!("{}: {failed} task(s) failed, {timed_out} timed out", adapter.name());
    }

    for stall in heartbeat::stalls(&outcome.samples, config.stall_threshold) {
        debug!("stall of {:?} ending at +{:?}", stall.gap, stall.at);
    }

    let verdict = judge(&outcome, config, policy, baseline.as_ref());
    info!(
        "{}: {} in {:?}, {} stall(s) over {} heartbeats",
        adapter.name(),
        if verdict.passed { "PASS" } else { "FAIL" },
        outcome.duration,
        verdict.stall_count,
        outcome.samples.len()
    );

    Ok(Detection {
        adapter: adapter.name(),
        config: config.clone(),
        policy: *policy,
        baseline,
        outcome,
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{AsyncSleep, ThreadSleep};
    use crate::domain::ConfigError;
    use std::time::Duration;

    fn registry() -> AdapterRegistry {
        AdapterRegistry::new()
            .with(AsyncSleep::new(Duration::from_millis(1), Duration::from_millis(100)))
            .with(ThreadSleep::new(Duration::ZERO, Duration::from_millis(50)))
    }

    fn config(tasks: usize, blocking: usize) -> RunConfig {
        RunConfig {
            task_count: tasks,
            blocking_task_count: blocking,
            timeout: Duration::from_secs(5),
            stall_threshold: Duration::from_millis(10),
            heartbeat_interval: Duration::from_millis(1),
            ..RunConfig::default()
        }
    }

    #[tokio::test]
    async fn test_blocking_adapter_fails_with_stall() {
        let detection = detect(
            &registry(),
            "thread-sleep",
            &config(20, 1),
            &EvaluationPolicy::default(),
            Calibration::Skip,
        )
        .await
        .unwrap();

        let verdict = &detection.verdict;
        assert!(!verdict.passed);
        assert!(verdict.stall_count >= 1);
        assert!(verdict.stall_durations.iter().any(|d| *d >= Duration::from_millis(10)));
        assert!(verdict.reasons.iter().any(|r| r.contains("stall")));
    }

    #[tokio::test]
    async fn test_calibration_records_baseline() {
        let detection = detect(
            &registry(),
            "sleep",
            &config(30, 1),
            &EvaluationPolicy::default(),
            Calibration::Uncontended,
        )
        .await
        .unwrap();

        let baseline = detection.baseline.unwrap();
        assert!((baseline.completion_rate - 1.0).abs() < f64::EPSILON);
        assert!(baseline.p95.is_some());
        assert_eq!(detection.outcome.records.len(), 30);
    }

    #[tokio::test]
    async fn test_config_error_aborts_before_launch() {
        let err = detect(
            &registry(),
            "sleep",
            &config(1, 1),
            &EvaluationPolicy::default(),
            Calibration::Skip,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DetectorError::Config(ConfigError::NoProbeTasks { .. })));
    }

    #[test]
    fn test_runtime_is_accepted_by_detect() {
        let runtime = runtime().unwrap();
        assert_eq!(runtime.handle().runtime_flavor(), RuntimeFlavor::CurrentThread);

        let detection = runtime
            .block_on(detect(
                &registry(),
                "sleep",
                &config(20, 1),
                &EvaluationPolicy::default(),
                Calibration::Skip,
            ))
            .unwrap();
        assert_eq!(detection.outcome.records.len(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_multi_thread_runtime_rejected() {
        let err = detect(
            &registry(),
            "sleep",
            &config(10, 1),
            &EvaluationPolicy::default(),
            Calibration::Skip,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DetectorError::SharedRuntimeRequired));
    }
}
