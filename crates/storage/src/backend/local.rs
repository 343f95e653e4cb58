//! Local filesystem storage backend.
//!
//! Files are accessed using `tokio::fs` for async I/O. The byte-for-byte copy
//! is blocking work and runs on Tokio's blocking pool.

use crate::backend::{Depth, FileInfoStream};
use crate::error::{ErrorKind, Result};
use crate::{FileInfo, StorageBackend, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use filetime::FileTime;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem storage backend.
///
/// All paths are relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use keysort_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Sources must already exist...
/// let source = LocalBackend::open("source", "/home/me/Downloads")?;
/// // ...targets are created on demand.
/// let target = LocalBackend::new("target", "/home/me/Sorted")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Create a backend rooted at `root`, which does not need to exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute, or [`NotADirectory`](ErrorKind::NotADirectory) if something
    /// other than a directory already lives there.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() && !root.is_dir() {
            exn::bail!(ErrorKind::NotADirectory(root));
        }
        Ok(Self { name: name.into(), root })
    }

    /// Create a backend over an existing directory.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus [`NotFound`](ErrorKind::NotFound) or
    /// [`PermissionDenied`](ErrorKind::PermissionDenied) when the directory
    /// can't be inspected.
    pub fn open(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let backend = Self::new(name, root)?;
        // Non-async: happens once per batch and isn't worth an async constructor.
        let metadata = std::fs::metadata(&backend.root).map_err(|e| Self::map_io_error(e, &backend.root))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::NotADirectory(backend.root));
        }
        Ok(backend)
    }

    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Strips the root prefix from an absolute path found while walking.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        validate_path(relative)
    }

    fn map_io_error(e: io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists(path.to_path_buf()),
            io::ErrorKind::NotADirectory => ErrorKind::NotADirectory(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Keeps the stream loop free of error plumbing: every failure comes back
    /// as a typed error the loop can log and move past.
    async fn process_entry(&self, entry: DirEntry) -> Result<WalkEntry> {
        let path = entry.path();
        // `file_type()` does not follow symlinks, so linked directories are
        // never descended into (no cycles).
        let file_type = entry.file_type().await.map_err(|e| Self::map_io_error(e, &path))?;
        if file_type.is_dir() {
            return Ok(WalkEntry::Descend(path));
        }
        // Symlinks to files count as files.
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            // Broken symlink.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(WalkEntry::Skip),
            Err(e) => return Err(Self::map_io_error(e, &path).into()),
        };
        if !metadata.is_file() {
            return Ok(WalkEntry::Skip);
        }
        Ok(WalkEntry::File(FileInfo::new(self.relative_path(&path)?, metadata.len())))
    }

    /// Second half of a cross-device move: `copied` already holds the file.
    /// If `source` can't be removed the copy is deleted again, so the file
    /// ends up in one place only.
    async fn remove_source_or_rollback(&self, source: &Path, copied: &Path) -> Result<()> {
        let Err(e) = fs::remove_file(source).await else {
            return Ok(());
        };
        if let Err(rollback) = fs::remove_file(copied).await {
            tracing::warn!(backend = %self.name, path = %copied.display(), error = %rollback, "Could not remove copy after failed move");
        }
        exn::bail!(Self::map_io_error(e, source))
    }
}

/// Copy `source` into a temporary sibling of `destination`, then link it into
/// place. Dropping the temporary file on any early return removes it, so a
/// failed copy never leaves a truncated file at `destination`.
fn copy_noclobber(source: &Path, destination: &Path, relative: &Path) -> Result<u64> {
    let Some(folder) = destination.parent() else {
        exn::bail!(ErrorKind::InvalidPath(relative.to_path_buf()));
    };
    let mut reader = File::open(source).map_err(|e| LocalBackend::map_io_error(e, source))?;
    let metadata = reader.metadata().map_err(|e| LocalBackend::map_io_error(e, source))?;
    let mut staged = NamedTempFile::new_in(folder).map_err(|e| LocalBackend::map_io_error(e, relative))?;
    let bytes = io::copy(&mut reader, staged.as_file_mut()).map_err(ErrorKind::Io)?;
    staged.as_file().set_permissions(metadata.permissions()).map_err(ErrorKind::Io)?;
    filetime::set_file_handle_times(
        staged.as_file(),
        Some(FileTime::from_last_access_time(&metadata)),
        Some(FileTime::from_last_modification_time(&metadata)),
    )
    .map_err(ErrorKind::Io)?;
    staged.persist_noclobber(destination).map_err(|e| LocalBackend::map_io_error(e.error, relative))?;
    Ok(bytes)
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        self.absolute_path(path)
    }

    fn list_stream<'a>(&'a self, depth: Depth) -> FileInfoStream<'a> {
        Box::pin(stream! {
            let mut stack = vec![self.root.clone()];
            let mut at_root = true;
            'dirs: while let Some(current) = stack.pop() {
                let listing_root = std::mem::replace(&mut at_root, false);
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) if listing_root => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        return;
                    },
                    Err(err) => {
                        tracing::warn!(backend = %self.name, path = %current.display(), error = %err, "Skipping unreadable directory");
                        continue 'dirs;
                    },
                };

                let mut subdirs = Vec::new();
                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(err) if listing_root => {
                            yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                            return;
                        },
                        Err(err) => {
                            tracing::warn!(backend = %self.name, path = %current.display(), error = %err, "Directory listing interrupted");
                            break 'entries;
                        },
                    };
                    match self.process_entry(entry).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) if depth == Depth::Recursive => subdirs.push(d),
                        Ok(WalkEntry::Descend(_)) | Ok(WalkEntry::Skip) => {},
                        Err(e) => {
                            let reason: &ErrorKind = &e;
                            tracing::warn!(backend = %self.name, error = %reason, "Skipping unreadable entry");
                        },
                    };
                }
                // Reversed so the first listed sub-directory is walked next.
                stack.extend(subdirs.into_iter().rev());
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        match fs::create_dir_all(&abs_path).await {
            Ok(()) => Ok(()),
            // `create_dir_all` reports a file squatting on the folder's name
            // as AlreadyExists; callers need to know it isn't a folder.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => exn::bail!(ErrorKind::NotADirectory(path.to_path_buf())),
            Err(e) => Err(Self::map_io_error(e, path).into()),
        }
    }

    async fn copy_in(&self, source: &Path, to: &Path) -> Result<u64> {
        let abs_path = self.absolute_path(to)?;
        let source = source.to_path_buf();
        let relative = to.to_path_buf();
        tokio::task::spawn_blocking(move || copy_noclobber(&source, &abs_path, &relative))
            .await
            .or_raise(|| ErrorKind::BackendError("copy task did not run to completion".to_string()))?
    }

    async fn move_in(&self, source: &Path, to: &Path) -> Result<()> {
        let abs_path = self.absolute_path(to)?;
        // Rename replaces existing files on most platforms; the check plus a
        // single writer per target keeps this from clobbering anything.
        if fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)? {
            exn::bail!(ErrorKind::AlreadyExists(to.to_path_buf()));
        }
        match fs::rename(source, &abs_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                tracing::debug!(backend = %self.name, source = %source.display(), "Source is on another filesystem; copying instead");
                self.copy_in(source, to).await?;
                self.remove_source_or_rollback(source, &abs_path).await
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => exn::bail!(ErrorKind::NotFound(source.to_path_buf())),
            Err(e) => Err(Self::map_io_error(e, to).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::TryStreamExt;
    use std::fs as sync_fs;
    use std::time::{Duration, SystemTime};

    fn backend(dir: &tempfile::TempDir) -> LocalBackend {
        LocalBackend::new("name", dir.path()).unwrap()
    }

    async fn list(backend: &LocalBackend, depth: Depth) -> Result<Vec<FileInfo>> {
        backend.list_stream(depth).try_collect().await
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "relative/path").is_err());
        assert!(LocalBackend::new("name", "./relative").is_err());
    }

    #[test]
    fn test_new_allows_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path().join("later")).is_ok());
    }

    #[test]
    fn test_open_requires_existing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::open("name", temp_dir.path()).is_ok());
        let err = LocalBackend::open("name", temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let file = temp_dir.path().join("file.txt");
        sync_fs::write(&file, b"data").unwrap();
        let err = LocalBackend::open("name", &file).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }

    #[test]
    fn test_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        let expected = temp_dir.path().join("Photos/a.jpg");
        assert_eq!(backend.absolute(Path::new("Photos/a.jpg")).unwrap(), expected);
        assert!(backend.absolute(Path::new("../etc/passwd")).is_err());
    }

    #[test]
    fn test_relative_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        let abs = temp_dir.path().join("Photos/a.jpg");
        assert_eq!(backend.relative_path(&abs).unwrap(), Path::new("Photos/a.jpg"));
        assert!(backend.relative_path(Path::new("/other/file.jpg")).is_err());
    }

    #[tokio::test]
    async fn test_list_shallow_skips_subdirectories() {
        let temp_dir = tempfile::tempdir().unwrap();
        sync_fs::write(temp_dir.path().join("top.txt"), b"data").unwrap();
        sync_fs::create_dir(temp_dir.path().join("sub")).unwrap();
        sync_fs::write(temp_dir.path().join("sub/nested.txt"), b"data").unwrap();
        let files = list(&backend(&temp_dir), Depth::Shallow).await.unwrap();
        assert_eq!(files, vec![FileInfo::new("top.txt", 4)]);
    }

    #[tokio::test]
    async fn test_list_recursive_is_top_down() {
        let temp_dir = tempfile::tempdir().unwrap();
        sync_fs::create_dir_all(temp_dir.path().join("a/deeper")).unwrap();
        sync_fs::create_dir(temp_dir.path().join("b")).unwrap();
        sync_fs::write(temp_dir.path().join("top.txt"), b"1").unwrap();
        sync_fs::write(temp_dir.path().join("a/one.txt"), b"1").unwrap();
        sync_fs::write(temp_dir.path().join("a/deeper/two.txt"), b"1").unwrap();
        sync_fs::write(temp_dir.path().join("b/three.txt"), b"1").unwrap();
        let files = list(&backend(&temp_dir), Depth::Recursive).await.unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths.len(), 4);
        // Whatever order the filesystem lists things in, a directory's own
        // files always come before anything below it.
        let position = |p: &str| paths.iter().position(|x| x == Path::new(p)).unwrap();
        assert_eq!(position("top.txt"), 0);
        assert!(position("a/one.txt") < position("a/deeper/two.txt"));
    }

    #[tokio::test]
    async fn test_list_missing_root_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path().join("gone")).unwrap();
        let err = list(&backend, Depth::Recursive).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let files = list(&backend(&temp_dir), Depth::Recursive).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        assert!(!backend.exists(Path::new("file.txt")).await.unwrap());
        sync_fs::write(temp_dir.path().join("file.txt"), b"Hello, world!").unwrap();
        assert!(backend.exists(Path::new("file.txt")).await.unwrap());
        sync_fs::create_dir(temp_dir.path().join("Docs")).unwrap();
        assert!(backend.exists(Path::new("Docs")).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_dir_all() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        backend.create_dir_all(Path::new("a/b/c")).await.unwrap();
        assert!(temp_dir.path().join("a/b/c").is_dir());
        // Idempotent.
        backend.create_dir_all(Path::new("a/b/c")).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_dir_all_blocked_by_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        sync_fs::write(temp_dir.path().join("Docs"), b"not a folder").unwrap();
        let err = backend(&temp_dir).create_dir_all(Path::new("Docs")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_copy_in_preserves_content_and_mtime() {
        let source_dir = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("photo.jpg");
        sync_fs::write(&source, b"pixels").unwrap();
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        filetime::set_file_mtime(&source, FileTime::from_system_time(mtime)).unwrap();

        let backend = backend(&target_dir);
        backend.create_dir_all(Path::new("Photos")).await.unwrap();
        let bytes = backend.copy_in(&source, Path::new("Photos/photo.jpg")).await.unwrap();

        assert_eq!(bytes, 6);
        let copied = target_dir.path().join("Photos/photo.jpg");
        assert_eq!(sync_fs::read(&copied).unwrap(), b"pixels");
        assert_eq!(sync_fs::metadata(&copied).unwrap().modified().unwrap(), mtime);
        assert!(source.exists());
        // No staging files left behind.
        assert_eq!(sync_fs::read_dir(target_dir.path().join("Photos")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_copy_in_never_overwrites() {
        let source_dir = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("a.txt");
        sync_fs::write(&source, b"new").unwrap();
        sync_fs::write(target_dir.path().join("a.txt"), b"old").unwrap();
        let err = backend(&target_dir).copy_in(&source, Path::new("a.txt")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(sync_fs::read(target_dir.path().join("a.txt")).unwrap(), b"old");
        assert_eq!(sync_fs::read_dir(target_dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_copy_in_missing_source_leaves_nothing() {
        let source_dir = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let err = backend(&target_dir)
            .copy_in(&source_dir.path().join("vanished.txt"), Path::new("vanished.txt"))
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert_eq!(sync_fs::read_dir(target_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_move_in() {
        let source_dir = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("song.mp3");
        sync_fs::write(&source, b"la la la").unwrap();
        let backend = backend(&target_dir);
        backend.create_dir_all(Path::new("Music")).await.unwrap();
        backend.move_in(&source, Path::new("Music/song.mp3")).await.unwrap();
        assert!(!source.exists());
        assert_eq!(sync_fs::read(target_dir.path().join("Music/song.mp3")).unwrap(), b"la la la");
    }

    #[tokio::test]
    async fn test_move_in_never_overwrites() {
        let source_dir = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("a.txt");
        sync_fs::write(&source, b"new").unwrap();
        sync_fs::write(target_dir.path().join("a.txt"), b"old").unwrap();
        let err = backend(&target_dir).move_in(&source, Path::new("a.txt")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert!(source.exists());
        assert_eq!(sync_fs::read(target_dir.path().join("a.txt")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_move_in_missing_source() {
        let source_dir = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let err = backend(&target_dir)
            .move_in(&source_dir.path().join("gone.txt"), Path::new("gone.txt"))
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cross_device_move_removes_source() {
        let source_dir = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("song.mp3");
        let copied = target_dir.path().join("song.mp3");
        sync_fs::write(&source, b"la").unwrap();
        sync_fs::write(&copied, b"la").unwrap();
        backend(&target_dir).remove_source_or_rollback(&source, &copied).await.unwrap();
        assert!(!source.exists());
        assert_eq!(sync_fs::read(&copied).unwrap(), b"la");
    }

    #[tokio::test]
    async fn test_cross_device_move_rolls_back_copy() {
        let source_dir = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        // The source can't be removed because it is a non-empty folder.
        let source = source_dir.path().join("locked");
        sync_fs::create_dir(&source).unwrap();
        sync_fs::write(source.join("inner.txt"), b"x").unwrap();
        let copied = target_dir.path().join("locked");
        sync_fs::write(&copied, b"la").unwrap();
        let err = backend(&target_dir).remove_source_or_rollback(&source, &copied).await.unwrap_err();
        assert!(!matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert!(source.exists());
        assert!(!copied.exists());
    }

    #[tokio::test]
    async fn test_path_security() {
        let source_dir = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("a.txt");
        sync_fs::write(&source, b"data").unwrap();
        let backend = backend(&target_dir);
        assert!(backend.create_dir_all(Path::new("../escape")).await.is_err());
        assert!(backend.copy_in(&source, Path::new("../a.txt")).await.is_err());
        assert!(backend.move_in(&source, Path::new("x/../../a.txt")).await.is_err());
        assert!(source.exists());
    }
}
