mod cli;
mod render;

use crate::cli::{BatchArgs, Cli, Command};
use clap::Parser;
use keysort_config::Settings;
use keysort_library::{BatchConfig, Outcome, Report, preview, start_batch, start_dry_run};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: u8 = 1;
const EXIT_WITH_ERRORS: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let (batch, dry_run) = match cli.command {
        Command::HelpPatterns => {
            print!("{}", render::PATTERN_HELP);
            return ExitCode::SUCCESS;
        },
        Command::Preview(batch) => (batch, None),
        Command::Run { batch, dry_run } => (batch, Some(dry_run)),
    };

    let settings = match Settings::load(batch.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", *e);
            return ExitCode::from(EXIT_FAILURE);
        },
    };
    init_tracing(cli.verbose, settings.log_level.as_deref());
    let Some(config) = batch_config(&batch, settings) else {
        return ExitCode::from(EXIT_FAILURE);
    };

    match dry_run {
        None => run_preview(&config).await,
        Some(dry_run) => run(config, dry_run).await,
    }
}

fn init_tracing(verbose: u8, configured: Option<&str>) {
    let fallback = match verbose {
        0 => configured.unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn batch_config(args: &BatchArgs, settings: Settings) -> Option<BatchConfig> {
    match args.apply(settings).batch_config() {
        Ok(config) => {
            tracing::debug!(source = %config.source().display(), target = %config.target().display(), "Configuration accepted");
            Some(config)
        },
        Err(e) => {
            eprintln!("error: {}", *e);
            None
        },
    }
}

async fn run_preview(config: &BatchConfig) -> ExitCode {
    match preview(config).await {
        Ok(preview) => {
            print!("{}", render::preview(&preview));
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("error: {}", *e);
            ExitCode::from(EXIT_FAILURE)
        },
    }
}

async fn run(config: BatchConfig, dry_run: bool) -> ExitCode {
    let mode = config.mode();
    let started = if dry_run { start_dry_run(config) } else { start_batch(config) };
    let mut handle = match started {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("error: {}", *e);
            return ExitCode::from(EXIT_FAILURE);
        },
    };

    let canceller = handle.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling after the current file...");
            canceller.cancel();
        }
    });

    while let Some(progress) = handle.progress().await {
        println!("{}", render::progress(&progress));
    }
    let report = match handle.finish().await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}", *e);
            return ExitCode::from(EXIT_FAILURE);
        },
    };
    println!();
    print!("{}", render::summary(&report, mode, dry_run));
    exit_code(&report)
}

fn exit_code(report: &Report) -> ExitCode {
    match &report.outcome {
        Outcome::Completed if report.log.errors().is_empty() => ExitCode::SUCCESS,
        Outcome::Completed => ExitCode::from(EXIT_WITH_ERRORS),
        Outcome::Cancelled => ExitCode::from(EXIT_CANCELLED),
        Outcome::EnumerationFailed(_) => ExitCode::from(EXIT_FAILURE),
    }
}
