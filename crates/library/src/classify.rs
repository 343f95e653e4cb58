//! Rule classification and the read-only preview.

use crate::config::{BatchConfig, Rule};
use crate::scan::discover;
use crate::scan::error::Result as ScanResult;
use keysort_storage::FileInfo;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where a matched [`Candidate`] is headed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// The rule's folder label, as reported in results.
    pub label: String,
    /// The label as a path relative to the target root.
    pub folder: PathBuf,
}
impl From<&Rule> for Destination {
    fn from(rule: &Rule) -> Self {
        Self {
            label: rule.destination().to_string(),
            folder: rule.folder().to_path_buf(),
        }
    }
}

/// A discovered file under consideration for transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute path of the file in the source tree.
    pub full_path: PathBuf,
    /// Path relative to the source root.
    pub path: PathBuf,
    /// Final path component exactly as stored on disk. Destination names are
    /// built from this.
    pub name: OsString,
    /// [`name`](Self::name) as text (lossy for non-UTF-8 names); the only
    /// thing patterns are matched against, and what reports show.
    pub filename: String,
    pub size: u64,
    destination: Option<Destination>,
}
impl Candidate {
    pub fn new(full_path: PathBuf, file: FileInfo) -> Self {
        Self {
            name: file.path.file_name().map(ToOwned::to_owned).unwrap_or_default(),
            filename: file.file_name(),
            full_path,
            path: file.path,
            size: file.size,
            destination: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.destination.is_some()
    }

    /// The label of the rule that claimed this file, if any.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_ref().map(|d| d.label.as_str())
    }

    /// The target-relative folder this file goes to, if matched.
    pub fn folder(&self) -> Option<&Path> {
        self.destination.as_ref().map(|d| d.folder.as_path())
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }
}

/// Assigns each candidate the destination of the first rule whose pattern
/// matches its file name. Later rules are never consulted for a file once one
/// matched. Unmatched candidates are kept (with no destination) and order is
/// preserved.
pub fn classify(candidates: Vec<Candidate>, rules: &[Rule]) -> Vec<Candidate> {
    candidates
        .into_iter()
        .map(|candidate| match rules.iter().find(|rule| rule.pattern().matches(&candidate.filename)) {
            Some(rule) => candidate.with_destination(Destination::from(rule)),
            None => Candidate { destination: None, ..candidate },
        })
        .collect()
}

/// Files headed for one destination folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewGroup {
    pub destination: String,
    pub files: Vec<String>,
}

/// What a batch would do, without doing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    /// One group per destination label, in order of first appearance.
    pub groups: Vec<PreviewGroup>,
    /// Names of files no rule matched.
    pub unmatched: Vec<String>,
}
impl Preview {
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        let mut preview = Self::default();
        for candidate in candidates {
            let Some(label) = candidate.destination() else {
                preview.unmatched.push(candidate.filename.clone());
                continue;
            };
            match preview.groups.iter_mut().find(|group| group.destination == label) {
                Some(group) => group.files.push(candidate.filename.clone()),
                None => preview.groups.push(PreviewGroup {
                    destination: label.to_string(),
                    files: vec![candidate.filename.clone()],
                }),
            }
        }
        preview
    }

    /// Number of files that would be transferred.
    pub fn matched_count(&self) -> usize {
        self.groups.iter().map(|group| group.files.len()).sum()
    }
}

/// Scans and classifies the source folder without touching anything.
pub async fn preview(config: &BatchConfig) -> ScanResult<Preview> {
    let candidates = classify(discover(config).await?, config.rules());
    Ok(Preview::from_candidates(&candidates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Mode, validate_config};
    use std::fs;

    fn candidate(name: &str) -> Candidate {
        Candidate::new(PathBuf::from("/source").join(name), FileInfo::new(name, 0))
    }

    fn config(dir: &Path, rules: &[(&str, &str)]) -> BatchConfig {
        validate_config(dir.to_str().unwrap(), "", rules.iter().copied(), Mode::Copy, false).unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &[("a", "X"), ("a|b", "Y")]);
        let classified = classify(vec![candidate("ab.txt"), candidate("b.txt"), candidate("c.txt")], config.rules());
        let destinations: Vec<_> = classified.iter().map(Candidate::destination).collect();
        assert_eq!(destinations, [Some("X"), Some("Y"), None]);
        assert_eq!(classified[0].folder(), Some(Path::new("X")));
    }

    #[test]
    fn test_classify_matches_file_name_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &[("photos", "Photos")]);
        let file = Candidate::new(PathBuf::from("/photos/a.txt"), FileInfo::new("photos/a.txt", 0));
        let classified = classify(vec![file], config.rules());
        assert_eq!(classified[0].filename, "a.txt");
        assert!(!classified[0].is_matched());
    }

    #[test]
    fn test_preview_groups_by_first_appearance() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &[("pdf", "Docs"), ("jpg", "Photos")]);
        let names = ["b.jpg", "a.pdf", "c.jpg", "notes.txt"];
        let classified = classify(names.iter().map(|n| candidate(n)).collect(), config.rules());
        let preview = Preview::from_candidates(&classified);
        assert_eq!(
            preview.groups,
            vec![
                PreviewGroup { destination: "Photos".into(), files: vec!["b.jpg".into(), "c.jpg".into()] },
                PreviewGroup { destination: "Docs".into(), files: vec!["a.pdf".into()] },
            ]
        );
        assert_eq!(preview.unmatched, vec!["notes.txt".to_string()]);
        assert_eq!(preview.matched_count(), 3);
    }

    #[tokio::test]
    async fn test_preview_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("invoice.pdf"), b"pdf").unwrap();
        fs::write(dir.path().join("readme.md"), b"md").unwrap();
        let config = config(dir.path(), &[("invoice", "Finance")]);

        let preview = preview(&config).await.unwrap();
        assert_eq!(preview.matched_count(), 1);
        assert_eq!(preview.groups[0].destination, "Finance");
        assert_eq!(preview.unmatched, vec!["readme.md".to_string()]);
        assert!(!dir.path().join("Finance").exists());
        assert!(dir.path().join("invoice.pdf").exists());
    }
}
