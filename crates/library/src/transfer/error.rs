//! Error types for the [`transfer`](super) module.
//!
//! These never escape a batch: each one ends up as a
//! [`TransferError`](crate::TransferError) in the result log.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A per-file transfer error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A storage operation failed; carries the storage layer's reason.
    #[display("{_0}")]
    Storage(#[error(not(source))] String),
    /// Every numbered variant of the file name is already taken.
    #[display("no free file name for {name} in {}", folder.display())]
    NamesExhausted { name: String, folder: PathBuf },
}
impl From<&keysort_storage::error::ErrorKind> for ErrorKind {
    fn from(kind: &keysort_storage::error::ErrorKind) -> Self {
        Self::Storage(kind.to_string())
    }
}
