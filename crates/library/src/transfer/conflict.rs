//! Free-name search for files landing in an occupied folder.

use std::ffi::{OsStr, OsString};

/// Highest numeric suffix tried before a file is reported as unplaceable.
pub const MAX_COLLISION_SUFFIX: u32 = 100_000;

/// The `n`th name tried for `filename`: the name itself for `0`, otherwise
/// `_n` inserted before the extension.
///
/// Works on the name as stored on disk, so names that aren't valid UTF-8
/// keep their bytes. Only the last extension counts, and leading dots never
/// start one:
///
/// ```
/// use keysort_library::candidate_name;
///
/// assert_eq!(candidate_name("photo.jpg", 0), "photo.jpg");
/// assert_eq!(candidate_name("photo.jpg", 2), "photo_2.jpg");
/// assert_eq!(candidate_name("archive.tar.gz", 1), "archive.tar_1.gz");
/// assert_eq!(candidate_name(".bashrc", 1), ".bashrc_1");
/// ```
pub fn candidate_name(filename: impl AsRef<OsStr>, n: u32) -> OsString {
    let filename = filename.as_ref();
    if n == 0 {
        return filename.to_os_string();
    }
    let (stem, extension) = split_extension(filename);
    let mut name = stem.to_os_string();
    name.push(format!("_{n}"));
    name.push(extension);
    name
}

/// Names to try in order, from the bare name up to [`MAX_COLLISION_SUFFIX`].
pub(crate) fn candidate_names(filename: &OsStr) -> impl Iterator<Item = OsString> + '_ {
    (0..=MAX_COLLISION_SUFFIX).map(move |n| candidate_name(filename, n))
}

fn split_extension(filename: &OsStr) -> (&OsStr, &OsStr) {
    let bytes = filename.as_encoded_bytes();
    let leading_dots = bytes.iter().take_while(|&&b| b == b'.').count();
    match bytes.iter().rposition(|&b| b == b'.') {
        Some(dot) if dot >= leading_dots => {
            let (stem, extension) = bytes.split_at(dot);
            // SAFETY: both halves come from an `OsStr` split immediately
            // before an ASCII `.`, which is a valid boundary.
            unsafe { (OsStr::from_encoded_bytes_unchecked(stem), OsStr::from_encoded_bytes_unchecked(extension)) }
        },
        _ => (filename, OsStr::new("")),
    }
}
