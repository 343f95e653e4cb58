//! Plain-text rendering of previews, progress and summaries.

use keysort_library::{Mode, Outcome, Preview, Progress, Report};
use std::fmt::Write;

/// How many names to list per folder (and how many errors) before
/// summarising the rest.
const LISTED: usize = 10;
/// Longest file name shown on a progress line.
const PROGRESS_NAME_WIDTH: usize = 40;

pub const PATTERN_HELP: &str = "\
Keyword patterns (case-insensitive, matched against the whole file name):

  apple            names containing \"apple\"
  apple * red      names containing both \"apple\" and \"red\"
  apple | orange   names containing \"apple\" or \"orange\"
  apple ! red      names containing \"apple\" but not \"red\"

Examples:
  photo * 2024     matches vacation_photo_2024.jpg
  jpg | png        matches .jpg and .png files
  report ! draft   matches final_report.pdf but not draft_report.pdf

Operators do not combine. If a pattern has a single `!` it is an exclusion;
otherwise any `|` makes it an OR, otherwise any `*` makes it an AND. Other
operator characters are then matched literally.

Rules are tried in order and a file goes to the first folder whose pattern
matches.
";

pub fn preview(preview: &Preview) -> String {
    let mut out = String::new();
    if preview.groups.is_empty() {
        out.push_str("No files match the given keywords.\n");
    }
    for group in &preview.groups {
        let _ = writeln!(out, "{} ({} files):", group.destination, group.files.len());
        for file in group.files.iter().take(LISTED) {
            let _ = writeln!(out, "   - {file}");
        }
        if group.files.len() > LISTED {
            let _ = writeln!(out, "   ... and {} more files", group.files.len() - LISTED);
        }
    }
    if !preview.unmatched.is_empty() {
        let _ = writeln!(out, "\n{} files won't be processed (no keyword match)", preview.unmatched.len());
    }
    out
}

pub fn progress(progress: &Progress) -> String {
    let name: String = progress.filename.chars().take(PROGRESS_NAME_WIDTH).collect();
    let ellipsis = if progress.filename.chars().count() > PROGRESS_NAME_WIDTH { "..." } else { "" };
    format!("[{:>3}%] {name}{ellipsis}", progress.percent)
}

pub fn summary(report: &Report, mode: Mode, dry_run: bool) -> String {
    let mut out = String::new();
    let heading = match (&report.outcome, dry_run) {
        (Outcome::Completed, false) => "complete",
        (Outcome::Completed, true) => "complete (dry run)",
        (Outcome::Cancelled, _) => "cancelled",
        (Outcome::EnumerationFailed(_), _) => "failed",
    };
    let _ = writeln!(out, "Operation {heading} - {}", mode.to_string().to_uppercase());
    if let Outcome::EnumerationFailed(e) = &report.outcome {
        let _ = writeln!(out, "{}", **e);
        return out;
    }
    let log = &report.log;
    if log.matched() == 0 {
        out.push_str("No files matched the given keywords.\n");
        return out;
    }
    let _ = writeln!(out, "Total files processed: {} of {}", log.total_processed(), log.matched());
    if !log.successes().is_empty() {
        out.push_str("\nFiles organized by folder:\n");
        for (folder, count) in log.successes() {
            let _ = writeln!(out, "  {folder}: {count} files");
        }
    }
    if !log.errors().is_empty() {
        let _ = writeln!(out, "\nErrors ({}):", log.errors().len());
        for error in log.errors().iter().take(LISTED) {
            let _ = writeln!(out, "  - {}: {}", error.filename, error.message);
        }
        if log.errors().len() > LISTED {
            let _ = writeln!(out, "  ... and {} more errors", log.errors().len() - LISTED);
        }
    }
    out
}
