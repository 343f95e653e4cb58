//! Batch results.

use crate::scan::error::Error as ScanError;

/// A file that could not be transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferError {
    pub filename: String,
    pub message: String,
}

/// Accumulated outcome of a batch.
///
/// Owned by the worker while the batch runs and handed to the caller once it
/// ends; nothing else writes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultLog {
    successes: Vec<(String, u64)>,
    errors: Vec<TransferError>,
    total_processed: u64,
    matched: u64,
    bytes: u64,
}
impl ResultLog {
    pub(crate) fn new(matched: usize) -> Self {
        Self {
            matched: u64::try_from(matched).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    pub(crate) fn record_success(&mut self, destination: &str, bytes: u64) {
        match self.successes.iter_mut().find(|(label, _)| label == destination) {
            Some((_, count)) => *count += 1,
            None => self.successes.push((destination.to_string(), 1)),
        }
        self.total_processed += 1;
        self.bytes += bytes;
    }

    pub(crate) fn record_error(&mut self, filename: impl Into<String>, message: impl Into<String>) {
        self.errors.push(TransferError {
            filename: filename.into(),
            message: message.into(),
        });
    }

    /// Files placed per destination label, in the order each label first
    /// received a file.
    pub fn successes(&self) -> &[(String, u64)] {
        &self.successes
    }

    /// Files placed under one destination label.
    pub fn placed_in(&self, destination: &str) -> Option<u64> {
        self.successes.iter().find(|(label, _)| label == destination).map(|(_, count)| *count)
    }

    /// Per-file failures in the order they happened.
    pub fn errors(&self) -> &[TransferError] {
        &self.errors
    }

    /// Files transferred successfully.
    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    /// Files a rule matched, whether or not they were reached.
    pub fn matched(&self) -> u64 {
        self.matched
    }

    /// Bytes written to the target (copies only; renames count the file size).
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// How a batch ended.
#[derive(Debug)]
pub enum Outcome {
    /// Every matched file was attempted.
    Completed,
    /// Stopped between files at the caller's request.
    Cancelled,
    /// The source folder could not be listed; nothing was transferred.
    EnumerationFailed(ScanError),
}
impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// The final word on a batch.
#[derive(Debug)]
pub struct Report {
    pub log: ResultLog,
    pub outcome: Outcome,
}
