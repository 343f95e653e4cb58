//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait: a unified, asynchronous
//! interface over a directory tree that files are discovered in (a source)
//! or placed into (a target).

mod local;
mod ro;

pub use self::local::LocalBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// How far below the storage root a listing reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    /// Only files that are immediate children of the root.
    #[default]
    Shallow,
    /// Every file in the tree below the root.
    Recursive,
}
impl From<bool> for Depth {
    /// `true` means recursive, matching the "include subfolders" switch
    /// callers usually expose.
    fn from(recursive: bool) -> Self {
        match recursive {
            true => Self::Recursive,
            false => Self::Shallow,
        }
    }
}

/// Unified interface for storage backends.
///
/// # Path Handling
/// Paths passed to [`exists`](Self::exists),
/// [`create_dir_all`](Self::create_dir_all) and the destination argument of
/// [`copy_in`](Self::copy_in)/[`move_in`](Self::move_in) are relative to the
/// storage root and must pass [`validate_path`](crate::validate_path).
/// Implementations enforce this validation. The *source* argument of the
/// transfer methods is an absolute path anywhere on the local filesystem,
/// usually obtained from another backend's [`absolute`](Self::absolute).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use keysort_storage::{StorageBackend, error::Result};
///
/// async fn place_report(target: &dyn StorageBackend, report: &Path) -> Result<u64> {
///     target.create_dir_all(Path::new("Reports")).await?;
///     if target.exists(Path::new("Reports/q1.pdf")).await? {
///         return Ok(0);
///     }
///     target.copy_in(report, Path::new("Reports/q1.pdf")).await
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// Absolute directory every relative path is resolved against.
    fn root(&self) -> &Path;

    /// Resolve a relative storage path to its absolute location.
    fn absolute(&self, path: &Path) -> Result<PathBuf>;

    /// Stream metadata for regular files below the root.
    ///
    /// Directories are never yielded. Files are yielded top-down: every file
    /// of a directory (in the order the filesystem lists them) before the
    /// contents of its sub-directories, which are visited in listing order.
    ///
    /// # Notes
    /// - A root that cannot be listed yields a single error and ends the
    ///   stream. Problems further down the tree are logged and skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use keysort_storage::{Depth, StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream(Depth::Recursive);
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes", info.path.display(), info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, depth: Depth) -> FileInfoStream<'a>;

    /// Check if a file or folder exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Create a folder and any missing ancestors.
    ///
    /// Succeeds when the folder already exists. Returns
    /// [`NotADirectory`](crate::error::ErrorKind::NotADirectory) when a file
    /// is in the way.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Copy an external file to `to`, keeping the source in place.
    ///
    /// Content, permission bits, and access/modification times are carried
    /// over. Returns the number of bytes copied.
    ///
    /// # Notes
    /// - Never overwrites: returns
    ///   [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if `to`
    ///   is occupied.
    /// - A failed copy leaves nothing behind at `to`.
    /// - The parent folder of `to` must already exist.
    async fn copy_in(&self, source: &Path, to: &Path) -> Result<u64>;

    /// Move an external file to `to`, removing it from its source location.
    ///
    /// # Notes
    /// - Never overwrites: returns
    ///   [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if `to`
    ///   is occupied.
    /// - On failure at most one of source and destination holds the file.
    /// - The parent folder of `to` must already exist.
    async fn move_in(&self, source: &Path, to: &Path) -> Result<()>;
}
