//! The transfer executor.
//!
//! Places matched files one at a time, strictly in the order given. A file
//! that fails is recorded and the batch moves on; only cancellation stops it
//! early, and only between files.

mod conflict;
pub mod error;
mod file;

pub use self::conflict::{MAX_COLLISION_SUFFIX, candidate_name};
use crate::classify::Candidate;
use crate::config::Mode;
use crate::report::{Outcome, Report, ResultLog};
use crate::transfer::error::ErrorKind as TransferErrorKind;
use keysort_storage::BackendHandle;

/// Emitted after each file, whether it succeeded or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Share of matched files handled so far, rounded to the nearest whole
    /// percent.
    pub percent: u8,
    /// Name of the file just handled.
    pub filename: String,
    /// Zero-based position of that file.
    pub index: usize,
    pub total: usize,
}
impl Progress {
    fn new(index: usize, total: usize, filename: &str) -> Self {
        Self {
            percent: percent(index + 1, total),
            filename: filename.to_string(),
            index,
            total,
        }
    }
}

/// `round(100 * done / total)`, halves rounding up. This is neither
/// truncation nor round-half-to-even: 1 of 8 reports 13, not 12.
fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let (done, total) = (done as u128, total as u128);
    u8::try_from((200 * done + total) / (2 * total)).unwrap_or(100).min(100)
}

/// Transfers every matched candidate into `target`.
///
/// `is_cancelled` is consulted before each file; once it returns `true` no
/// further file is started and the report is [`Outcome::Cancelled`].
/// `on_progress` is called after every attempted file. Candidates without a
/// destination are ignored.
pub async fn execute<P, C>(
    candidates: &[Candidate],
    target: &BackendHandle,
    mode: Mode,
    mut on_progress: P,
    is_cancelled: C,
) -> Report
where
    P: FnMut(Progress),
    C: Fn() -> bool,
{
    let matched: Vec<&Candidate> = candidates.iter().filter(|c| c.is_matched()).collect();
    let total = matched.len();
    let mut log = ResultLog::new(total);

    for (index, candidate) in matched.into_iter().enumerate() {
        if is_cancelled() {
            tracing::info!(processed = log.total_processed(), remaining = total - index, "Batch cancelled");
            return Report { log, outcome: Outcome::Cancelled };
        }
        match file::transfer_file(target, candidate, mode).await {
            Ok(placed) => log.record_success(candidate.destination().unwrap_or_default(), placed.bytes),
            Err(e) => {
                let reason: &TransferErrorKind = &e;
                tracing::warn!(file = %candidate.path.display(), error = %reason, "Could not transfer file");
                log.record_error(candidate.filename.clone(), reason.to_string());
            },
        }
        on_progress(Progress::new(index, total, &candidate.filename));
    }

    Report { log, outcome: Outcome::Completed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1, 100)]
    #[case(1, 3, 33)]
    #[case(2, 3, 67)]
    #[case(1, 8, 13)]
    #[case(1, 200, 1)]
    #[case(1, 201, 0)]
    #[case(3, 3, 100)]
    fn test_percent_rounds_half_up(#[case] done: usize, #[case] total: usize, #[case] expected: u8) {
        assert_eq!(percent(done, total), expected);
    }

    #[test]
    fn test_progress() {
        let progress = Progress::new(0, 4, "a.txt");
        assert_eq!(progress, Progress { percent: 25, filename: "a.txt".into(), index: 0, total: 4 });
    }
}
