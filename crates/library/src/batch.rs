//! The batch worker.
//!
//! One batch is scan, then classify, then transfer, run on a single spawned
//! task so the caller stays free to show progress and offer a cancel button.
//! The caller talks to the worker only through the returned [`BatchHandle`]:
//! progress arrives on a channel and the final [`Report`] through
//! [`BatchHandle::finish`].

use crate::classify::classify;
use crate::config::BatchConfig;
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::report::{Outcome, Report, ResultLog};
use crate::scan::discover;
use crate::scan::error::ErrorKind as ScanErrorKind;
use crate::transfer::{Progress, execute};
use exn::ResultExt;
use keysort_storage::BackendHandle;
use keysort_storage::backend::{LocalBackend, ReadOnlyBackend};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs a whole batch on the current task.
///
/// Progress is sent on `progress` (a closed receiver is ignored) and `cancel`
/// is checked before each file.
pub async fn run_batch(
    config: &BatchConfig,
    target: &BackendHandle,
    progress: UnboundedSender<Progress>,
    cancel: CancellationToken,
) -> Report {
    tracing::info!(
        source = %config.source().display(),
        target = %target.root().display(),
        mode = %config.mode(),
        recursive = config.recursive(),
        rules = config.rules().len(),
        "Starting batch"
    );
    let candidates = match discover(config).await {
        Ok(candidates) => candidates,
        Err(e) => {
            let reason: &ScanErrorKind = &e;
            tracing::warn!(error = %reason, "Could not list source folder");
            return Report {
                log: ResultLog::default(),
                outcome: Outcome::EnumerationFailed(e),
            };
        },
    };
    if cancel.is_cancelled() {
        return Report {
            log: ResultLog::default(),
            outcome: Outcome::Cancelled,
        };
    }

    let classified = classify(candidates, config.rules());
    let report = execute(
        &classified,
        target,
        config.mode(),
        |p| {
            // The caller may have stopped listening; the batch carries on.
            let _ = progress.send(p);
        },
        || cancel.is_cancelled(),
    )
    .await;
    tracing::info!(
        processed = report.log.total_processed(),
        matched = report.log.matched(),
        errors = report.log.errors().len(),
        bytes = report.log.bytes(),
        outcome = ?report.outcome,
        "Batch finished"
    );
    report
}

/// Starts a batch that writes into the configured target folder.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
/// Returns [`Storage`](LibraryErrorKind::Storage) if the target folder cannot
/// be used (it is occupied by a file).
pub fn start_batch(config: BatchConfig) -> LibraryResult<BatchHandle> {
    let target: BackendHandle =
        Arc::new(LocalBackend::new("target", config.target()).or_raise(|| LibraryErrorKind::Storage)?);
    Ok(BatchHandle::spawn(config, target))
}

/// Starts a batch that walks the full transfer path, including free-name
/// search, without creating or changing anything.
pub fn start_dry_run(config: BatchConfig) -> LibraryResult<BatchHandle> {
    let inner: BackendHandle =
        Arc::new(LocalBackend::new("target", config.target()).or_raise(|| LibraryErrorKind::Storage)?);
    let target: BackendHandle = Arc::new(ReadOnlyBackend::new(inner));
    Ok(BatchHandle::spawn(config, target))
}

/// A running batch.
///
/// Dropping the handle does not stop the batch; call [`cancel`](Self::cancel)
/// first.
pub struct BatchHandle {
    cancel: CancellationToken,
    progress: UnboundedReceiver<Progress>,
    task: JoinHandle<Report>,
}
impl BatchHandle {
    fn spawn(config: BatchConfig, target: BackendHandle) -> Self {
        let cancel = CancellationToken::new();
        let (tx, progress) = unbounded_channel();
        let token = cancel.clone();
        let task = tokio::spawn(async move { run_batch(&config, &target, tx, token).await });
        Self { cancel, progress, task }
    }

    /// Asks the batch to stop before its next file. The file in flight, if
    /// any, is finished first.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this batch, for handing to a signal handler.
    pub fn canceller(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The next progress event, or `None` once the batch has stopped sending.
    pub async fn progress(&mut self) -> Option<Progress> {
        self.progress.recv().await
    }

    /// Waits for the batch to end.
    ///
    /// # Errors
    /// Returns [`Batch`](LibraryErrorKind::Batch) if the worker panicked or
    /// the runtime shut down underneath it.
    pub async fn finish(self) -> LibraryResult<Report> {
        self.task.await.or_raise(|| LibraryErrorKind::Batch)
    }
}
