//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep task identities, task kinds and display-only
//! durations from being mixed up with plain integers and floats.

// Display conversions intentionally lose precision
#![allow(clippy::cast_precision_loss)]

use std::fmt;
use std::time::Duration;

/// Task ID (0-indexed, launch order)
///
/// Assigned by the workload generator. Completion order is unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u32);

impl TaskId {
    /// Position of this task in the generated workload
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// What a task asks its adapter to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Lightweight operation whose latency measures contention
    Probe,
    /// Deliberately slow operation that creates the contention
    Blocking,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Probe => f.write_str("probe"),
            TaskKind::Blocking => f.write_str("blocking"),
        }
    }
}

/// Terminal state of a task. Every task ends in exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Completed,
    TimedOut,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Completed => f.write_str("completed"),
            TaskStatus::TimedOut => f.write_str("timed_out"),
            TaskStatus::Failed => f.write_str("failed"),
        }
    }
}

/// Human-readable duration
///
/// Renders sub-second values in milliseconds and longer values in seconds,
/// always with two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Millis(pub Duration);

impl Millis {
    /// Fractional milliseconds, as written to reports
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0.as_nanos() as f64 / 1_000_000.0
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.as_f64();
        if ms >= 1000.0 {
            write!(f, "{:.2}s", self.0.as_secs_f64())
        } else {
            write!(f, "{ms:.2}ms")
        }
    }
}
