//! Analysis of finished runs
//!
//! Pure functions only: the engine hands over a [`crate::engine::RunOutcome`]
//! and gets back metrics and a [`Verdict`]. Nothing here touches the runtime.

pub mod evaluator;
pub mod metrics;

pub use evaluator::{evaluate, judge, EvaluationPolicy, P95Ceiling, Verdict};
pub use metrics::{aggregate, nearest_rank, Baseline, RunMetrics, StallSummary, TaskCounts};
