//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Validation and scanning report their
//! own kinds ([`config::error`](crate::config::error),
//! [`scan::error`](crate::scan::error)); this one covers starting and joining
//! the batch worker.
//!
//! Per-file transfer failures are never errors at this level: they are data,
//! collected in the [`ResultLog`](crate::ResultLog).

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A storage backend could not be set up.
    #[display("could not prepare storage")]
    Storage,
    /// The background worker stopped without producing a report.
    #[display("batch worker stopped unexpectedly")]
    Batch,
}
