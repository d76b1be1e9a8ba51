//! Workload generation
//!
//! Turns a [`RunConfig`] into the ordered list of task descriptors the harness
//! launches. Blocking tasks are spread evenly through the list rather than
//! placed up front, so probes launched before and after them all compete with
//! the blocking work for the scheduler.

use crate::domain::{ConfigError, RunConfig, TaskId, TaskKind};

/// A task to launch: identity plus the adapter mode it exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    pub id: TaskId,
    pub kind: TaskKind,
}

fn task_id(index: usize) -> TaskId {
    TaskId(u32::try_from(index).unwrap_or(u32::MAX))
}

/// Position of blocking task `j` of `b` in a workload of `n`
fn blocking_slot(j: usize, n: usize, b: usize) -> usize {
    let (j, n, b) = (j as u128, n as u128, b as u128);
    usize::try_from((2 * j + 1) * n / (2 * b)).unwrap_or(usize::MAX)
}

/// Build the contended workload
///
/// Blocking task `j` of `b` lands at position `⌊(2j + 1)·n / 2b⌋`, the midpoint
/// of the j-th of `b` equal slices. Because `n > b` the slices are wider than
/// one task and the positions never collide.
///
/// # Errors
/// Returns [`ConfigError`] if a count is zero or no probe tasks would remain
pub fn generate(config: &RunConfig) -> Result<Vec<TaskSpec>, ConfigError> {
    config.validate_counts()?;

    let n = config.task_count;
    let b = config.blocking_task_count;
    let mut next_blocking = 0;

    let tasks = (0..n)
        .map(|index| {
            let kind = if next_blocking < b && index == blocking_slot(next_blocking, n, b) {
                next_blocking += 1;
                TaskKind::Blocking
            } else {
                TaskKind::Probe
            };
            TaskSpec { id: task_id(index), kind }
        })
        .collect();

    Ok(tasks)
}

/// Probe-only workload with the same probe count, for uncontended calibration
#[must_use]
pub fn baseline(config: &RunConfig) -> Vec<TaskSpec> {
    (0..config.probe_count())
        .map(|index| TaskSpec { id: task_id(index), kind: TaskKind::Probe })
        .collect()
}
