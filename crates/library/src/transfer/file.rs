use crate::classify::Candidate;
use crate::config::Mode;
use crate::transfer::conflict::candidate_names;
use crate::transfer::error::{ErrorKind as TransferErrorKind, Result as TransferResult};
use keysort_storage::BackendHandle;
use keysort_storage::error::{Error as StorageError, ErrorKind as StorageErrorKind};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Where a file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placed {
    /// Path relative to the target root.
    pub path: PathBuf,
    pub bytes: u64,
}

/// Raises a storage failure as a transfer failure, keeping the storage
/// frame as a child in the error tree.
#[track_caller]
fn storage(err: StorageError) -> exn::Exn<TransferErrorKind> {
    let kind = TransferErrorKind::from(err.deref());
    err.raise(kind)
}

/// Places one matched file in its destination folder under `target`.
///
/// The folder is created if needed. An occupied name moves on to the next
/// numbered variant, including when another writer takes a name between the
/// existence check and the transfer.
#[instrument(level = "debug", skip_all, fields(file = %candidate.filename, destination = candidate.destination()))]
pub(crate) async fn transfer_file(target: &BackendHandle, candidate: &Candidate, mode: Mode) -> TransferResult<Placed> {
    let Some(folder) = candidate.folder() else {
        // Unmatched candidates are filtered out before this point.
        exn::bail!(TransferErrorKind::Storage(format!("no destination for {}", candidate.filename)));
    };
    target.create_dir_all(folder).await.map_err(storage)?;

    for name in candidate_names(&candidate.name) {
        let path = folder.join(&name);
        if target.exists(&path).await.map_err(storage)? {
            continue;
        }
        match place(target, candidate, &path, mode).await {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), bytes, "Transferred file");
                return Ok(Placed { path, bytes });
            },
            Err(e) if matches!(e.deref(), StorageErrorKind::AlreadyExists(_)) => {
                tracing::debug!(path = %path.display(), "Name was taken during transfer; trying the next one");
            },
            Err(e) => return Err(storage(e)),
        }
    }
    exn::bail!(TransferErrorKind::NamesExhausted {
        name: candidate.filename.clone(),
        folder: folder.to_path_buf(),
    })
}

async fn place(target: &BackendHandle, candidate: &Candidate, to: &Path, mode: Mode) -> Result<u64, StorageError> {
    match mode {
        Mode::Copy => target.copy_in(&candidate.full_path, to).await,
        Mode::Move => {
            target.move_in(&candidate.full_path, to).await?;
            Ok(candidate.size)
        },
    }
}
