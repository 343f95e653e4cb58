//! Storage models.

use std::path::PathBuf;

/// File metadata returned by storage backends while listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self { path: path.into(), size }
    }

    /// Final path component, the name rules are matched against.
    ///
    /// Non-UTF8 names are converted lossily; the original bytes remain
    /// available through [`path`](Self::path).
    pub fn file_name(&self) -> String {
        self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }
}
