//! Read-only storage backend.
//!
//! Wraps another backend and prevents mutating operations from executing,
//! while still indicating success on return. Dry runs use this to walk the
//! whole transfer path without touching the target.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::backend::{Depth, FileInfoStream};
use crate::error::{ErrorKind, Result};
use crate::{BackendHandle, StorageBackend};

/// Read-only storage backend.
///
/// Wraps another backend and silently drops all mutating operations, logging
/// an [`info event`](tracing::Event) for each.
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: BackendHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn root(&self) -> &Path {
        self.inner.root()
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        self.inner.absolute(path)
    }

    fn list_stream<'a>(&'a self, depth: Depth) -> FileInfoStream<'a> {
        self.inner.list_stream(depth)
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "Skipping folder creation during read-only mode");
        Ok(())
    }

    async fn copy_in(&self, source: &Path, to: &Path) -> Result<u64> {
        // Report the size that would have been copied.
        let metadata = tokio::fs::metadata(source).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(source.to_path_buf()),
            _ => ErrorKind::Io(e),
        })?;
        tracing::info!(source = %source.display(), path = %to.display(), "Skipping copy during read-only mode");
        Ok(metadata.len())
    }

    async fn move_in(&self, source: &Path, to: &Path) -> Result<()> {
        tracing::info!(source = %source.display(), path = %to.display(), "Skipping move during read-only mode");
        Ok(())
    }
}
