//! Command-line arguments.

use clap::{ArgAction, Args, Parser, Subcommand};
use keysort_config::{RuleSetting, Settings};
use keysort_library::Mode;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "keysort", version, about = "Sort files into folders by keyword rules")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// More output (-v info, -vv debug, -vvv trace). `RUST_LOG` wins.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show which folder each file would go to, without touching anything.
    Preview(BatchArgs),
    /// Copy or move matching files into their folders.
    Run {
        #[command(flatten)]
        batch: BatchArgs,
        /// Report what would happen without creating or changing any file.
        #[arg(long)]
        dry_run: bool,
    },
    /// Explain the keyword pattern language.
    HelpPatterns,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Config file (TOML, YAML or JSON by extension).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Folder to collect files from.
    #[arg(short, long, value_name = "DIR")]
    pub source: Option<String>,
    /// Folder to sort into (defaults to the source folder).
    #[arg(short, long, value_name = "DIR")]
    pub target: Option<String>,
    /// A rule; repeat for more. Earlier rules win. Replaces configured rules.
    #[arg(short, long = "rule", value_name = "PATTERN=>FOLDER", value_parser = parse_rule)]
    pub rules: Vec<RuleSetting>,
    /// Include files in sub-folders.
    #[arg(long)]
    pub recursive: bool,
    /// Whether to copy or move files.
    #[arg(long, value_name = "MODE", value_parser = parse_mode, conflicts_with = "move_files")]
    pub mode: Option<Mode>,
    /// Shorthand for `--mode move`.
    #[arg(long = "move")]
    pub move_files: bool,
}

fn parse_rule(value: &str) -> Result<RuleSetting, String> {
    value.parse::<RuleSetting>().map_err(|e| (*e).to_string())
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    value.parse::<Mode>().map_err(|e| (*e).to_string())
}

impl BatchArgs {
    /// Layers the command-line flags over loaded settings.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(source) = &self.source {
            settings.source = source.clone();
        }
        if let Some(target) = &self.target {
            settings.target = target.clone();
        }
        if !self.rules.is_empty() {
            settings.rules = self.rules.clone();
        }
        if self.recursive {
            settings.recursive = true;
        }
        settings.mode = self.resolve_mode(settings.mode);
        settings
    }

    fn resolve_mode(&self, configured: Mode) -> Mode {
        match (self.mode, self.move_files) {
            (Some(mode), _) => mode,
            (None, true) => Mode::Move,
            (None, false) => configured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("keysort").chain(args.iter().copied())).unwrap()
    }

    fn batch(args: &[&str]) -> BatchArgs {
        match parse(args).command {
            Command::Preview(batch) | Command::Run { batch, .. } => batch,
            Command::HelpPatterns => panic!("expected a batch command"),
        }
    }

    #[test]
    fn test_run_arguments() {
        let cli = parse(&["-vv", "run", "-s", "/in", "-r", "jpg | png=>Photos", "--rule", "pdf=>Docs", "--dry-run"]);
        assert_eq!(cli.verbose, 2);
        let Command::Run { batch, dry_run } = cli.command else {
            panic!("expected run");
        };
        assert!(dry_run);
        assert_eq!(batch.source.as_deref(), Some("/in"));
        assert_eq!(
            batch.rules,
            vec![
                RuleSetting { pattern: "jpg | png".into(), destination: "Photos".into() },
                RuleSetting { pattern: "pdf".into(), destination: "Docs".into() },
            ]
        );
    }

    #[test]
    fn test_malformed_rule_is_rejected() {
        assert!(Cli::try_parse_from(["keysort", "preview", "-r", "no separator"]).is_err());
        assert!(Cli::try_parse_from(["keysort", "run", "--mode", "teleport"]).is_err());
        assert!(Cli::try_parse_from(["keysort", "run", "--mode", "copy", "--move"]).is_err());
    }

    #[rstest]
    #[case(&["preview"], Mode::Copy, Mode::Copy)]
    #[case(&["preview"], Mode::Move, Mode::Move)]
    #[case(&["preview", "--move"], Mode::Copy, Mode::Move)]
    #[case(&["preview", "--mode", "copy"], Mode::Move, Mode::Copy)]
    #[case(&["preview", "--mode", "MOVE"], Mode::Copy, Mode::Move)]
    fn test_mode_resolution(#[case] args: &[&str], #[case] configured: Mode, #[case] expected: Mode) {
        let settings = Settings { mode: configured, ..Settings::default() };
        assert_eq!(batch(args).apply(settings).mode, expected);
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            source: "/configured".into(),
            target: "/sorted".into(),
            rules: vec![RuleSetting { pattern: "a".into(), destination: "A".into() }],
            ..Settings::default()
        };
        let applied = batch(&["run", "-s", "/flag", "-r", "b=>B", "--recursive"]).apply(settings.clone());
        assert_eq!(applied.source, "/flag");
        assert_eq!(applied.target, "/sorted");
        assert_eq!(applied.rules, vec![RuleSetting { pattern: "b".into(), destination: "B".into() }]);
        assert!(applied.recursive);
        // No rule flags keeps the configured list.
        assert_eq!(batch(&["run"]).apply(settings.clone()).rules, settings.rules);
    }
}
