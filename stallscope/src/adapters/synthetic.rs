//! Synthetic reference adapters
//!
//! Known-good and known-bad baselines that touch no real I/O. `sleep` waits on
//! the Tokio timer and always passes; `thread-sleep` parks the scheduler thread
//! and always stalls it.

use super::{Adapter, AdapterFuture};
use crate::domain::{AdapterError, TaskKind};
use std::time::Duration;
use tokio::time::Instant;

/// Long enough to overlap every probe of a default-sized run
const DEFAULT_ASYNC_BLOCKING: Duration = Duration::from_secs(1);
const DEFAULT_ASYNC_PROBE: Duration = Duration::from_millis(1);

const DEFAULT_THREAD_BLOCKING: Duration = Duration::from_millis(50);
const DEFAULT_THREAD_PROBE: Duration = Duration::from_micros(200);

/// Non-blocking sleep on the Tokio timer
#[derive(Debug, Clone, Copy)]
pub struct AsyncSleep {
    probe: Duration,
    blocking: Duration,
}

impl AsyncSleep {
    #[must_use]
    pub fn new(probe: Duration, blocking: Duration) -> Self {
        Self { probe, blocking }
    }
}

impl Default for AsyncSleep {
    fn default() -> Self {
        Self::new(DEFAULT_ASYNC_PROBE, DEFAULT_ASYNC_BLOCKING)
    }
}

impl Adapter for AsyncSleep {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn description(&self) -> &'static str {
        "synthetic: tokio::time::sleep (genuinely non-blocking)"
    }

    fn perform(&self, kind: TaskKind) -> AdapterFuture<'_> {
        let wait = match kind {
            TaskKind::Probe => self.probe,
            TaskKind::Blocking => self.blocking,
        };
        Box::pin(async move {
            let start = Instant::now();
            tokio::time::sleep(wait).await;
            Ok::<_, AdapterError>(start.elapsed())
        })
    }

    // Dropping a pending sleep cancels it cleanly
    fn supports_cancellation(&self) -> bool {
        true
    }
}

/// `std::thread::sleep` inside an async fn
#[derive(Debug, Clone, Copy)]
pub struct ThreadSleep {
    probe: Duration,
    blocking: Duration,
}

impl ThreadSleep {
    #[must_use]
    pub fn new(probe: Duration, blocking: Duration) -> Self {
        Self { probe, blocking }
    }
}

impl Default for ThreadSleep {
    fn default() -> Self {
        Self::new(DEFAULT_THREAD_PROBE, DEFAULT_THREAD_BLOCKING)
    }
}

impl Adapter for ThreadSleep {
    fn name(&self) -> &'static str {
        "thread-sleep"
    }

    fn description(&self) -> &'static str {
        "synthetic: std::thread::sleep on the scheduler thread (fake async)"
    }

    fn perform(&self, kind: TaskKind) -> AdapterFuture<'_> {
        let wait = match kind {
            TaskKind::Probe => self.probe,
            TaskKind::Blocking => self.blocking,
        };
        Box::pin(async move {
            let start = std::time::Instant::now();
            std::thread::sleep(wait);
            Ok::<_, AdapterError>(start.elapsed())
        })
    }
}
