//! Path validation.
//!
//! Every path handed to a backend is relative to that backend's root. Rule
//! destinations are user-typed folder labels, so they go through the same
//! check before anything is created on disk.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a path relative to a storage root.
///
/// `.` components, repeated and trailing separators are dropped; `..`
/// components are resolved as long as they never climb above the root.
/// Null bytes, platform prefixes (`C:`) and paths that normalize to nothing
/// are rejected with [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// A leading separator is ignored rather than rejected: `/Photos` is the
/// `Photos` folder inside the root, never the filesystem root.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use keysort_storage::validate_path;
/// assert!(validate_path("Photos").is_ok());
/// assert!(validate_path("Photos/2024/Summer").is_ok());
/// assert!(validate_path("Photos/../Documents").is_ok()); // (never leaves the root)
/// assert!(validate_path("../Photos").is_err());
/// assert!(validate_path("a/../../b").is_err());
/// assert!(validate_path("Pho\0tos").is_err());
/// assert_eq!(
///     validate_path("Work/./Reports//2024/").unwrap(),
///     Path::new("Work/Reports/2024")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            // Null bytes pass through Path::components() on Unix but truncate
            // paths in C-based syscalls.
            Component::Normal(segment) if segment.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(segment) => normalized.push(segment),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if !normalized.pop() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if normalized.as_os_str().is_empty() {
        exn::bail!(invalid());
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Photos", "Photos")]
    #[case("Photos/2024", "Photos/2024")]
    #[case("report.pdf", "report.pdf")]
    #[case("a//b//c", "a/b/c")]
    #[case("a/./b/./c", "a/b/c")]
    #[case("Photos/", "Photos")]
    #[case("Photos///", "Photos")]
    #[case("/Photos", "Photos")]
    #[case("a/b/..", "a")]
    #[case("Photos/../Documents", "Documents")]
    fn test_valid_paths(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("./")]
    #[case("./.")]
    #[case("//")]
    #[case("..")]
    #[case("../..")]
    #[case("../etc/passwd")]
    #[case("a/../../b")]
    #[case("a\0b")]
    #[case("\0")]
    fn test_invalid_paths(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[cfg(windows)]
    #[test]
    fn test_backslash_normalization() {
        assert_eq!(validate(Path::new("a\\b\\c")).unwrap(), Path::new("a/b/c"));
        assert!(validate(Path::new("C:\\Photos")).is_err());
    }
}
