//! Adapters under test
//!
//! An adapter wraps one I/O library behind a two-mode contract: a cheap
//! **probe** operation whose latency is measured under contention, and a
//! **blocking** operation that creates the contention. Genuinely async
//! adapters implement the blocking mode as slow work that still yields to the
//! scheduler; fake async adapters run it directly on the scheduler thread.
//!
//! The [`AdapterRegistry`] is built once at startup and handed to the engine.
//! Nothing inside the engine looks adapters up globally.

pub mod compression;
pub mod csv;
pub mod filesystem;
pub mod hashing;
pub mod scratch;
pub mod synthetic;

use crate::domain::{AdapterError, DetectorError, TaskKind};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub use compression::{DeflateInline, DeflateOffload};
pub use csv::CsvAsync;
pub use filesystem::{StdFs, TokioFs};
pub use hashing::BcryptInline;
pub use scratch::ScratchDir;
pub use synthetic::{AsyncSleep, ThreadSleep};

/// Result of a single adapter operation: elapsed time or the I/O failure
pub type AdapterFuture<'a> = BoxFuture<'a, Result<Duration, AdapterError>>;

/// Capability contract implemented by every library under test.
///
/// Implementations must release scratch resources (files, handles) on every
/// exit path of `perform`, including failure.
pub trait Adapter: Send + Sync {
    /// Registry key, as typed on the command line
    fn name(&self) -> &'static str;

    /// One-line description shown by `list`
    fn description(&self) -> &'static str;

    /// Run one operation of the given kind
    fn perform(&self, kind: TaskKind) -> AdapterFuture<'_>;

    /// Whether in-flight work may be dropped when the run deadline passes.
    ///
    /// Adapters that return `false` have their outstanding work detached and
    /// left to finish on its own.
    fn supports_cancellation(&self) -> bool {
        false
    }
}

/// Await `op` and report how long it took
pub(crate) async fn timed<F, T>(op: F) -> Result<Duration, AdapterError>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    let start = Instant::now();
    op.await?;
    Ok(start.elapsed())
}

/// Immutable name → adapter mapping
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<&'static str, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter
    ///
    /// # Errors
    /// Returns an error if the shared scratch directory cannot be created
    pub fn builtin() -> io::Result<Self> {
        let scratch = Arc::new(ScratchDir::new()?);

        Ok(Self::new()
            .with(TokioFs::new(Arc::clone(&scratch)))
            .with(StdFs::new(Arc::clone(&scratch)))
            .with(CsvAsync::new(scratch))
            .with(DeflateOffload)
            .with(DeflateInline)
            .with(BcryptInline)
            .with(AsyncSleep::default())
            .with(ThreadSleep::default()))
    }

    /// Add an adapter, replacing any existing one with the same name
    #[must_use]
    pub fn with(mut self, adapter: impl Adapter + 'static) -> Self {
        self.adapters.insert(adapter.name(), Arc::new(adapter));
        self
    }

    /// Look up an adapter by name
    ///
    /// # Errors
    /// Returns [`DetectorError::AdapterNotFound`] listing the known names
    pub fn get(&self, name: &str) -> Result<Arc<dyn Adapter>, DetectorError> {
        self.adapters.get(name).cloned().ok_or_else(|| DetectorError::AdapterNotFound {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }

    /// Registered names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.keys().copied().collect()
    }

    /// Registered adapters in name order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Adapter>> {
        self.adapters.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
