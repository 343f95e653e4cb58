//! Error types for the [`config`](super) module.
//!
//! Uses [`exn`] for automatic location tracking. Every kind is reported to
//! the caller before a batch begins; nothing on disk has been touched.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A validation error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for validation.
pub type Result<T> = std::result::Result<T, Error>;

/// Why the supplied configuration cannot start a batch.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No source folder was given.
    #[display("please select a source folder")]
    EmptySource,
    /// The source folder does not exist.
    #[display("source folder does not exist: {}", _0.display())]
    SourceNotFound(#[error(not(source))] PathBuf),
    /// The source path exists but is not a folder.
    #[display("source path must be a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    /// A path could not be made absolute.
    #[display("cannot resolve path: {}", _0.display())]
    UnresolvablePath(#[error(not(source))] PathBuf),
    /// Only one half of a rule was filled in (zero-based row index).
    #[display("rule {} needs both a keyword and a folder name", _0 + 1)]
    IncompleteRule(#[error(not(source))] usize),
    /// A destination label would escape the target folder.
    #[display("invalid destination folder: {_0}")]
    InvalidDestination(#[error(not(source))] String),
    /// The transfer mode is neither `copy` nor `move`.
    #[display("unknown transfer mode: {_0}")]
    UnknownMode(#[error(not(source))] String),
    /// No usable rule remained.
    #[display("please enter at least one keyword and folder name pair")]
    NoRules,
}
