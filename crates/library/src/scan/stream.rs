use crate::classify::Candidate;
use crate::config::BatchConfig;
use crate::scan::error::{ErrorKind as ScanErrorKind, Result as ScanResult};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, TryStreamExt};
use keysort_storage::backend::LocalBackend;
use keysort_storage::{BackendHandle, Depth, FileInfo};
use std::sync::Arc;

/// Streams every regular file below the backend's root.
///
/// With `recursive` unset only the root's immediate children are listed.
/// A root that cannot be read ends the stream with a single
/// [`Listing`](ScanErrorKind::Listing) error.
pub fn scan(backend: &BackendHandle, recursive: bool) -> impl Stream<Item = ScanResult<FileInfo>> + '_ {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        for await file in backend.list_stream(Depth::from(recursive)) {
            match file {
                Ok(file) => yield Ok(file),
                Err(e) => {
                    yield Err::<FileInfo, _>(e).or_raise(|| ScanErrorKind::Listing(backend.root().to_path_buf()));
                    return;
                },
            }
        }
    })
}

/// Opens the configured source folder and collects every file in it as an
/// unclassified [`Candidate`].
///
/// The whole listing is gathered before returning so that transfers never
/// run while the source tree is still being walked.
pub async fn discover(config: &BatchConfig) -> ScanResult<Vec<Candidate>> {
    let backend: BackendHandle = Arc::new(
        LocalBackend::open("source", config.source())
            .or_raise(|| ScanErrorKind::Source(config.source().to_path_buf()))?,
    );
    let files: Vec<FileInfo> = scan(&backend, config.recursive()).try_collect().await?;
    tracing::debug!(source = %config.source().display(), count = files.len(), "Discovered files");
    files
        .into_iter()
        .map(|file| {
            let full_path =
                backend.absolute(&file.path).or_raise(|| ScanErrorKind::Listing(config.source().to_path_buf()))?;
            Ok(Candidate::new(full_path, file))
        })
        .collect()
}
