//! Terminal output for `list` and `detect`

// Rates are printed as percentages
#![allow(clippy::cast_precision_loss)]

use crate::adapters::AdapterRegistry;
use crate::domain::{Millis, TaskKind, TaskStatus};
use crate::engine::Detection;
use std::fmt::Write as _;

/// Display every registered adapter, one per line
pub fn display_adapters(registry: &AdapterRegistry) {
    print!("{}", render_adapters(registry));
}

#[must_use]
pub fn render_adapters(registry: &AdapterRegistry) -> String {
    let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);
    let mut out = String::new();
    for adapter in registry.iter() {
        let cancel = if adapter.supports_cancellation() { "  [cancellable]" } else { "" };
        let _ = writeln!(out, "{:<width$}  {}{cancel}", adapter.name(), adapter.description());
    }
    out
}

/// Display the verdict summary of a detection
pub fn display_verdict(detection: &Detection, verbose: bool) {
    print!("{}", render_verdict(detection, verbose));
}

fn optional(value: Option<std::time::Duration>) -> String {
    value.map_or_else(|| "n/a".to_string(), |d| Millis(d).to_string())
}

#[must_use]
pub fn render_verdict(detection: &Detection, verbose: bool) -> String {
    let verdict = &detection.verdict;
    let config = &detection.config;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "adapter: {}  tasks: {} ({} blocking)  timeout: {}",
        detection.adapter,
        config.task_count,
        config.blocking_task_count,
        Millis(config.timeout)
    );
    if let Some(baseline) = &detection.baseline {
        let _ = writeln!(
            out,
            "baseline: completion {:.1}%  p95 {}",
            baseline.completion_rate * 100.0,
            optional(baseline.p95)
        );
    }
    let _ = writeln!(
        out,
        "throughput: {:.1} probes/s  p50: {}  p95: {} (ceiling {})",
        verdict.throughput,
        optional(verdict.p50),
        optional(verdict.p95),
        Millis(verdict.p95_ceiling)
    );
    let _ = writeln!(
        out,
        "completion: {:.1}%{}  completed: {}  timed out: {}  failed: {}",
        verdict.completion_rate * 100.0,
        if verdict.collapsed { " (collapsed)" } else { "" },
        verdict.counts.completed,
        verdict.counts.timed_out,
        verdict.counts.failed
    );
    let _ = writeln!(
        out,
        "stalls: {} (threshold {}, longest {})  duration: {}",
        verdict.stall_count,
        Millis(config.stall_threshold),
        optional(verdict.max_stall),
        Millis(verdict.duration)
    );

    if verbose {
        for (i, stall) in verdict.stall_durations.iter().enumerate() {
            let _ = writeln!(out, "  [STALL {}] {}", i + 1, Millis(*stall));
        }
        for record in detection.outcome.records.iter().filter(|r| r.status != TaskStatus::Completed)
        {
            let _ = writeln!(
                out,
                "  [{}] {} {}: {}",
                record.status.to_string().to_uppercase(),
                record.kind,
                record.id,
                record.error.as_deref().unwrap_or("no detail")
            );
        }
        // Wall time well above adapter time means the task waited on the scheduler
        for record in detection.outcome.of_kind(TaskKind::Blocking) {
            if let (Some(reported), Some(wall)) = (record.reported, record.latency()) {
                let _ = writeln!(
                    out,
                    "  [BLOCKING] {}: {} in adapter, {} wall",
                    record.id,
                    Millis(reported),
                    Millis(wall)
                );
            }
        }
    }

    if verdict.passed {
        let _ = writeln!(out, "PASS");
    } else {
        let _ = writeln!(out, "FAIL");
        for reason in &verdict.reasons {
            let _ = writeln!(out, "  - {reason}");
        }
    }
    out
}
