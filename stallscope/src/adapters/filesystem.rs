//! File round-trip adapters
//!
//! Both adapters perform the same work: write a payload to a scratch file,
//! read it back, overwrite it. `tokio-fs` goes through `tokio::fs`, which hands
//! each call to the blocking pool. `std-fs` calls `std::fs` straight from the
//! async fn, which is the textbook fake async pattern.

use super::{timed, Adapter, AdapterFuture, ScratchDir};
use crate::domain::{AdapterError, TaskKind};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

const PROBE_PAYLOAD: &[u8] = b"test content";
const REWRITE_PAYLOAD: &[u8] = b"new content";

/// The blocking mode writes this chunk [`BULK_CHUNKS`] times
static BULK_CHUNK: [u8; 64 * 1024] = [0xa5; 64 * 1024];
const BULK_CHUNKS: usize = 256;

fn check_round_trip(expected: &[u8], actual: &[u8]) -> Result<(), AdapterError> {
    if expected == actual {
        Ok(())
    } else {
        Err(AdapterError::Corrupt(format!(
            "wrote {} bytes, read back {}",
            expected.len(),
            actual.len()
        )))
    }
}

// =============================================================================
// TOKIO-FS
// =============================================================================

pub struct TokioFs {
    scratch: Arc<ScratchDir>,
}

impl TokioFs {
    #[must_use]
    pub fn new(scratch: Arc<ScratchDir>) -> Self {
        Self { scratch }
    }
}

async fn tokio_round_trip(path: PathBuf) -> Result<(), AdapterError> {
    tokio::fs::write(&path, PROBE_PAYLOAD).await?;
    let content = tokio::fs::read(&path).await?;
    check_round_trip(PROBE_PAYLOAD, &content)?;
    tokio::fs::write(&path, REWRITE_PAYLOAD).await?;
    Ok(())
}

async fn tokio_bulk_write(path: PathBuf) -> Result<(), AdapterError> {
    let mut file = tokio::fs::File::create(&path).await?;
    for _ in 0..BULK_CHUNKS {
        file.write_all(&BULK_CHUNK).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

impl Adapter for TokioFs {
    fn name(&self) -> &'static str {
        "tokio-fs"
    }

    fn description(&self) -> &'static str {
        "temp file write/read via tokio::fs (blocking pool offload)"
    }

    fn perform(&self, kind: TaskKind) -> AdapterFuture<'_> {
        Box::pin(timed(async move {
            match kind {
                TaskKind::Probe => self.scratch.with_file("txt", tokio_round_trip).await,
                TaskKind::Blocking => self.scratch.with_file("bin", tokio_bulk_write).await,
            }
        }))
    }
}

// =============================================================================
// STD-FS
// =============================================================================

pub struct StdFs {
    scratch: Arc<ScratchDir>,
}

impl StdFs {
    #[must_use]
    pub fn new(scratch: Arc<ScratchDir>) -> Self {
        Self { scratch }
    }
}

fn std_round_trip(path: &Path) -> Result<(), AdapterError> {
    std::fs::write(path, PROBE_PAYLOAD)?;
    let content = std::fs::read(path)?;
    check_round_trip(PROBE_PAYLOAD, &content)?;
    std::fs::write(path, REWRITE_PAYLOAD)?;
    Ok(())
}

fn std_bulk_write(path: &Path) -> Result<(), AdapterError> {
    let mut file = std::fs::File::create(path)?;
    for _ in 0..BULK_CHUNKS {
        file.write_all(&BULK_CHUNK)?;
    }
    file.sync_all()?;
    Ok(())
}

impl Adapter for StdFs {
    fn name(&self) -> &'static str {
        "std-fs"
    }

    fn description(&self) -> &'static str {
        "temp file write/read via std::fs inside an async fn (fake async)"
    }

    fn perform(&self, kind: TaskKind) -> AdapterFuture<'_> {
        Box::pin(timed(async move {
            match kind {
                TaskKind::Probe => self.scratch.with_file_sync("txt", std_round_trip),
                TaskKind::Blocking => self.scratch.with_file_sync("bin", std_bulk_write),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> Arc<ScratchDir> {
        Arc::new(ScratchDir::new().unwrap())
    }

    #[tokio::test]
    async fn test_tokio_fs_probe_cleans_up() {
        let scratch = scratch();
        let adapter = TokioFs::new(Arc::clone(&scratch));

        adapter.perform(TaskKind::Probe).await.unwrap();
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_std_fs_probe_cleans_up() {
        let scratch = scratch();
        let adapter = StdFs::new(Arc::clone(&scratch));

        adapter.perform(TaskKind::Probe).await.unwrap();
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_check_round_trip_detects_mismatch() {
        assert!(check_round_trip(b"abc", b"abc").is_ok());
        assert!(matches!(check_round_trip(b"abc", b"ab"), Err(AdapterError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_tokio_bulk_write_size() {
        let scratch = ScratchDir::new().unwrap();
        let path = scratch.file("bin");

        tokio_bulk_write(path.clone()).await.unwrap();
        let written = std::fs::metadata(&path).unwrap().len();
        assert_eq!(written, (BULK_CHUNK.len() * BULK_CHUNKS) as u64);
    }
}
