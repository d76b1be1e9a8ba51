//! Scratch space for file-backed adapters
//!
//! One temporary directory is shared by every file adapter and removed when
//! the registry is dropped. Each operation gets its own file name and deletes
//! the file before returning, so a failed or abandoned run leaves at most a
//! few stray files inside a directory that is cleaned up anyway.

use crate::domain::AdapterError;
use log::debug;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;

pub struct ScratchDir {
    dir: TempDir,
    next: AtomicU64,
}

impl ScratchDir {
    /// Create a fresh `stallscope-*` directory under the system temp dir
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("stallscope-").tempdir()?;
        Ok(Self { dir, next: AtomicU64::new(0) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Unique file path inside the scratch directory (not created)
    pub fn file(&self, extension: &str) -> PathBuf {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        self.dir.path().join(format!("op-{n}.{extension}"))
    }

    /// Run `op` on a fresh scratch path, then delete the file whatever the outcome
    pub async fn with_file<F, Fut, T>(&self, extension: &str, op: F) -> Result<T, AdapterError>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<T, AdapterError>>,
    {
        let path = self.file(extension);
        let outcome = op(path.clone()).await;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            // Cleanup failure only matters if the operation itself succeeded
            Err(e) if outcome.is_ok() => return Err(e.into()),
            Err(e) => debug!("cleanup of {} failed after adapter error: {e}", path.display()),
        }

        outcome
    }

    /// Blocking twin of [`with_file`](Self::with_file) for adapters that do
    /// their I/O synchronously
    pub fn with_file_sync<F, T>(&self, extension: &str, op: F) -> Result<T, AdapterError>
    where
        F: FnOnce(&Path) -> Result<T, AdapterError>,
    {
        let path = self.file(extension);
        let outcome = op(&path);

        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) if outcome.is_ok() => return Err(e.into()),
            Err(e) => debug!("cleanup of {} failed after adapter error: {e}", path.display()),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_file_removed_after_success() {
        let scratch = ScratchDir::new().unwrap();
        let written = scratch
            .with_file("txt", |path| async move {
                tokio::fs::write(&path, b"x").await?;
                Ok::<_, AdapterError>(path)
            })
            .await
            .unwrap();

        assert!(!written.exists());
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_file_removed_after_failure() {
        let scratch = ScratchDir::new().unwrap();
        let result: Result<(), _> = scratch
            .with_file("txt", |path| async move {
                tokio::fs::write(&path, b"x").await?;
                Err::<(), _>(AdapterError::Corrupt("boom".to_string()))
            })
            .await;

        assert!(matches!(result, Err(AdapterError::Corrupt(_))));
        assert_eq!(entries(scratch.path()), 0);
    }

    #[test]
    fn test_sync_cleanup_and_unique_names() {
        let scratch = ScratchDir::new().unwrap();
        assert_ne!(scratch.file("a"), scratch.file("a"));

        scratch
            .with_file_sync("bin", |path| {
                std::fs::write(path, b"abc")?;
                Ok::<_, AdapterError>(())
            })
            .unwrap();
        assert_eq!(entries(scratch.path()), 0);
    }

    #[test]
    fn test_directory_removed_on_drop() {
        let scratch = ScratchDir::new().unwrap();
        let dir = scratch.path().to_path_buf();
        drop(scratch);
        assert!(!dir.exists());
    }
}
