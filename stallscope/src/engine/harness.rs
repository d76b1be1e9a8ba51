//! # Scheduler Harness
//!
//! Launches every task of a workload concurrently on the current runtime,
//! alongside the heartbeat, and waits until all tasks settle or the global
//! deadline passes.
//!
//! ## Ownership
//!
//! Each spawned task builds and returns its own [`TaskRecord`]; the heartbeat
//! returns its own sample vector. Nothing is shared while the run is in
//! progress, and everything is read only after the join.
//!
//! ## Timeout
//!
//! Tasks still pending at the deadline are recorded as `timed_out`. Their work
//! is aborted only when the adapter says it can be cancelled; otherwise it is
//! detached and left to finish unobserved, or, for a calibration run that must
//! not leak into the run after it, awaited for up to one more timeout.

use super::heartbeat::{Heartbeat, Sample};
use super::workload::TaskSpec;
use crate::adapters::Adapter;
use crate::domain::{RunConfig, TaskError, TaskId, TaskKind, TaskStatus};
use futures::FutureExt;
use log::{debug, warn};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// What happens to non-cancellable work still running at the deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Leftovers {
    /// Hand it back to the runtime and return at once
    #[default]
    Detach,
    /// Wait up to one more timeout for it before returning
    Settle,
}

/// Outcome of a single task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub kind: TaskKind,
    /// When the task first ran (or was launched, if it never settled),
    /// relative to run start
    pub started: Duration,
    /// When the task settled, relative to run start. `None` for timed-out tasks.
    pub finished: Option<Duration>,
    pub status: TaskStatus,
    /// Elapsed time as reported by the adapter itself
    pub reported: Option<Duration>,
    /// Failure or timeout description
    pub error: Option<String>,
}

impl TaskRecord {
    /// Wall-clock latency of a settled task
    #[must_use]
    pub fn latency(&self) -> Option<Duration> {
        self.finished.map(|end| end.saturating_sub(self.started))
    }

    fn timed_out(spec: TaskSpec, launched: Duration, timeout: Duration) -> Self {
        let err = TaskError::TimedOut { task: spec.id, timeout };
        Self {
            id: spec.id,
            kind: spec.kind,
            started: launched,
            finished: None,
            status: TaskStatus::TimedOut,
            reported: None,
            error: Some(err.to_string()),
        }
    }
}

/// Everything observed during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Settled tasks in completion order, followed by timed-out tasks in id order
    pub records: Vec<TaskRecord>,
    /// Heartbeat samples in time order
    pub samples: Vec<Sample>,
    /// From first launch until the last task settled or the deadline passed
    pub duration: Duration,
}

impl RunOutcome {
    #[must_use]
    pub fn count(&self, status: TaskStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// Records of one kind
    pub fn of_kind(&self, kind: TaskKind) -> impl Iterator<Item = &TaskRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run one task to completion and describe the outcome
async fn run_task(adapter: Arc<dyn Adapter>, spec: TaskSpec, origin: Instant) -> TaskRecord {
    let started = origin.elapsed();
    // `perform` itself may panic before handing back a future
    let result = AssertUnwindSafe(async { adapter.perform(spec.kind).await }).catch_unwind().await;
    let finished = Some(origin.elapsed());

    let (status, reported, error) = match result {
        Ok(Ok(elapsed)) => (TaskStatus::Completed, Some(elapsed), None),
        Ok(Err(source)) => {
            let err = TaskError::Adapter { task: spec.id, source };
            (TaskStatus::Failed, None, Some(err))
        }
        Err(payload) => {
            let err = TaskError::Panicked { task: spec.id, message: panic_message(&*payload) };
            (TaskStatus::Failed, None, Some(err))
        }
    };

    TaskRecord {
        id: spec.id,
        kind: spec.kind,
        started,
        finished,
        status,
        reported,
        error: error.map(|e| e.to_string()),
    }
}

/// Launch `workload` against `adapter` and collect the outcome.
///
/// Must be called on a current-thread runtime so that tasks and heartbeat
/// share one scheduler; [`crate::engine::detect`] checks this. Never fails:
/// per-task errors and timeouts are recorded in the returned outcome.
pub async fn run(adapter: Arc<dyn Adapter>, workload: &[TaskSpec], config: &RunConfig) -> RunOutcome {
    run_with(adapter, workload, config, Leftovers::Detach).await
}

/// [`run`], choosing what happens to non-cancellable work left at the deadline
pub async fn run_with(
    adapter: Arc<dyn Adapter>,
    workload: &[TaskSpec],
    config: &RunConfig,
    leftovers: Leftovers,
) -> RunOutcome {
    let origin = Instant::now();
    let heartbeat = Heartbeat::start(origin, config.heartbeat_interval, config.expected_heartbeats());

    let mut tasks = JoinSet::new();
    let mut launched = Vec::with_capacity(workload.len());
    for &spec in workload {
        launched.push(origin.elapsed());
        tasks.spawn(run_task(Arc::clone(&adapter), spec, origin));
    }

    let deadline = origin + config.timeout;
    let mut records = Vec::with_capacity(workload.len());
    let mut settled = vec![false; workload.len()];

    loop {
        match tokio::time::timeout_at(deadline, tasks.join_next()).await {
            Ok(Some(Ok(record))) => {
                if let Some(err) = &record.error {
                    debug!("{err}");
                }
                if let Some(flag) = settled.get_mut(record.id.index()) {
                    *flag = true;
                }
                records.push(record);
            }
            // Panics are caught inside run_task, so this is cancellation only
            Ok(Some(Err(e))) => warn!("task join failed: {e}"),
            Ok(None) => break,
            Err(_) => {
                let outstanding = tasks.len();
                warn!("deadline of {:?} passed with {outstanding} task(s) outstanding", config.timeout);
                break;
            }
        }
    }
    let duration = origin.elapsed();

    let cancellable = adapter.supports_cancellation();
    if cancellable {
        tasks.abort_all();
    }

    records.extend(
        workload
            .iter()
            .zip(launched)
            .filter(|(spec, _)| settled.get(spec.id.index()) != Some(&true))
            .map(|(&spec, at)| TaskRecord::timed_out(spec, at, config.timeout)),
    );

    let samples = heartbeat.stop(config.grace_period).await;

    if !cancellable && !tasks.is_empty() {
        release(tasks, leftovers, config.timeout).await;
    }

    RunOutcome { records, samples, duration }
}

/// Let go of non-cancellable tasks that outlived the deadline
async fn release(mut tasks: JoinSet<TaskRecord>, leftovers: Leftovers, limit: Duration) {
    if leftovers == Leftovers::Settle {
        let outstanding = tasks.len();
        let drain = async { while tasks.join_next().await.is_some() {} };
        if tokio::time::timeout(limit, drain).await.is_ok() {
            debug!("{outstanding} late task(s) settled");
            return;
        }
        warn!("{} late task(s) still running after {limit:?}, detaching", tasks.len());
    }
    // Dropping a JoinSet aborts its tasks, so hand them back to the runtime
    tasks.detach_all();
}
