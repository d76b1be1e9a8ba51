//! Structured error types for stallscope
//!
//! Using thiserror for automatic Display implementation and error chaining.
//!
//! Only [`ConfigError`] and [`DetectorError`] abort a run. [`AdapterError`] and
//! [`TaskError`] are absorbed into the task records and degrade the metrics.

use super::types::TaskId;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("task count must be positive")]
    ZeroTasks,

    #[error("blocking task count must be positive")]
    ZeroBlockingTasks,

    #[error("task count {tasks} leaves no probe tasks next to {blocking} blocking task(s)")]
    NoProbeTasks { tasks: usize, blocking: usize },

    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("heartbeat interval {interval:?} must be shorter than stall threshold {threshold:?}")]
    HeartbeatTooSlow { interval: Duration, threshold: Duration },

    #[error("completion floor {0} is outside 0.0..=1.0")]
    InvalidCompletionFloor(f64),

    #[error("p95 baseline multiple {0} must be a positive number")]
    InvalidBaselineMultiple(f64),
}

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("unknown adapter '{name}' (available: {available})")]
    AdapterNotFound { name: String, available: String },

    #[error("detector requires a current-thread Tokio runtime so the heartbeat shares the adapters' scheduler")]
    SharedRuntimeRequired,
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("offloaded work did not finish: {0}")]
    Offload(#[from] tokio::task::JoinError),

    #[error("round trip returned unexpected data: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{task} did not settle within {timeout:?}")]
    TimedOut { task: TaskId, timeout: Duration },

    #[error("{task} failed: {source}")]
    Adapter {
        task: TaskId,
        #[source]
        source: AdapterError,
    },

    #[error("{task} panicked: {message}")]
    Panicked { task: TaskId, message: String },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write report {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
