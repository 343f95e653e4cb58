//! Batch configuration and validation.
//!
//! Front-ends collect a source folder, an optional target folder, rows of
//! `(keyword pattern, folder name)` and two switches. [`validate_config`]
//! turns that raw input into a [`BatchConfig`], the only thing the rest of
//! the library accepts. A `BatchConfig` never changes once built.

pub mod error;

use crate::config::error::{ErrorKind, Result};
use crate::pattern::Pattern;
use derive_more::Display;
use exn::ResultExt;
use keysort_storage::validate_path;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Hint text a front-end shows in an empty pattern field.
pub const PATTERN_PLACEHOLDER: &str = "e.g., photo * 2024";
/// Hint text a front-end shows in an empty folder field.
pub const DESTINATION_PLACEHOLDER: &str = "Folder name";

/// Whether matched files are duplicated or relocated.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Leave the source file in place.
    #[default]
    #[display("copy")]
    Copy,
    /// Remove the source file once it has been placed.
    #[display("move")]
    Move,
}
impl FromStr for Mode {
    type Err = error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "move" => Ok(Self::Move),
            other => exn::bail!(ErrorKind::UnknownMode(other.to_string())),
        }
    }
}

/// One classification rule: files matching `pattern` go to `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pattern: Pattern,
    destination: String,
    folder: PathBuf,
}
impl Rule {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The folder label as the user typed it (trimmed). Results are reported
    /// against this label.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The label normalized into a path relative to the target root.
    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

/// Validated settings for exactly one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    source: PathBuf,
    target: PathBuf,
    rules: Vec<Rule>,
    mode: Mode,
    recursive: bool,
}
impl BatchConfig {
    /// Absolute path of the folder files are collected from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Absolute path destination folders are created under.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rules in priority order; the first match wins.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }
}

fn is_blank(value: &str, placeholder: &str) -> bool {
    value.is_empty() || value == placeholder
}

/// Builds a [`BatchConfig`] from raw front-end input.
///
/// - `source` must name an existing directory.
/// - An empty `target` means "sort in place" (the source folder).
/// - Rule rows where both fields are empty or still show their placeholder
///   ([`PATTERN_PLACEHOLDER`], [`DESTINATION_PLACEHOLDER`]) are untouched
///   rows and are dropped. A row with only one field filled is rejected.
/// - Destination labels may name nested folders (`Photos/2024`) but may not
///   climb out of the target folder.
///
/// Both paths are made absolute against the current directory.
///
/// # Errors
/// Returns the first problem found as a [`config::error::ErrorKind`](ErrorKind).
///
/// # Example
///
/// ```no_run
/// use keysort_library::config::{Mode, validate_config};
///
/// let config = validate_config(
///     "/home/me/Downloads",
///     "",
///     [("photo * 2024", "Photos"), ("invoice | receipt", "Finance")],
///     Mode::Copy,
///     false,
/// ).unwrap();
/// assert_eq!(config.target(), config.source());
/// ```
pub fn validate_config<P, D>(
    source: &str,
    target: &str,
    rules: impl IntoIterator<Item = (P, D)>,
    mode: Mode,
    recursive: bool,
) -> Result<BatchConfig>
where
    P: AsRef<str>,
    D: AsRef<str>,
{
    let source = source.trim();
    if source.is_empty() {
        exn::bail!(ErrorKind::EmptySource);
    }
    let source_path = Path::new(source);
    if !source_path.exists() {
        exn::bail!(ErrorKind::SourceNotFound(source_path.to_path_buf()));
    }
    if !source_path.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(source_path.to_path_buf()));
    }
    let target = match target.trim() {
        "" => source,
        target => target,
    };

    let mut validated = Vec::new();
    for (index, (pattern, destination)) in rules.into_iter().enumerate() {
        let pattern = pattern.as_ref().trim();
        let destination = destination.as_ref().trim();
        match (is_blank(pattern, PATTERN_PLACEHOLDER), is_blank(destination, DESTINATION_PLACEHOLDER)) {
            (true, true) => continue,
            (false, false) => {},
            _ => exn::bail!(ErrorKind::IncompleteRule(index)),
        }
        let folder = validate_path(destination).or_raise(|| ErrorKind::InvalidDestination(destination.to_string()))?;
        validated.push(Rule {
            pattern: Pattern::from(pattern),
            destination: destination.to_string(),
            folder,
        });
    }
    if validated.is_empty() {
        exn::bail!(ErrorKind::NoRules);
    }

    Ok(BatchConfig {
        source: absolute(source_path)?,
        target: absolute(Path::new(target))?,
        rules: validated,
        mode,
        recursive,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).or_raise(|| ErrorKind::UnresolvablePath(path.to_path_buf()))
}
