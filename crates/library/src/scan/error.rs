//! Error types for the [`scan`](super) module.
//!
//! A scan error always aborts the batch before anything is transferred.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A scan error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source folder could not be opened (it vanished or was replaced
    /// after validation).
    #[display("cannot open source folder: {}", _0.display())]
    Source(#[error(not(source))] PathBuf),
    /// The source folder was opened but listing it failed.
    #[display("cannot list source folder: {}", _0.display())]
    Listing(#[error(not(source))] PathBuf),
}
