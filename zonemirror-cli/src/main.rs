//! zonemirror: mirror DNS zonefiles from mreg to the local nameserver.
//!
//! # Usage
//!
//! ```text
//! zonemirror [--config <path>] [--force] [--dry-run]
//! ```
//!
//! One invocation is one pass: lock, inventory, per-zone change decisions,
//! staged writes, state persistence, optional postcommand. Exit codes follow
//! sysexits where they apply: 0 on success (also when another run already
//! holds the lock), 78 (EX_CONFIG) for configuration problems, the
//! underlying errno for filesystem failures, 69 (EX_UNAVAILABLE) for
//! everything else.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use zonemirror_core::load_config;
use zonemirror_mreg::MregClient;
use zonemirror_sync::{run, RunOptions, RunOutcome, SyncError};

const EX_UNAVAILABLE: u8 = 69;
const EX_CONFIG: u8 = 78;

#[derive(Parser, Debug)]
#[command(
    name = "zonemirror",
    version,
    about = "Mirror DNS zonefiles from mreg to the local nameserver",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "zonemirror.yaml")]
    config: PathBuf,

    /// Fetch every zone even if upstream reports it unchanged.
    #[arg(long)]
    force: bool,

    /// Decide and log, but write nothing and skip the postcommand.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => return fail(&e.to_string(), ExitCode::from(EX_CONFIG)),
    };

    let client = MregClient::new(&config.mreg);
    let opts = RunOptions {
        force: cli.force,
        dry_run: cli.dry_run,
    };

    match run(&config, &client, opts) {
        Ok(RunOutcome::Completed(report)) => {
            println!(
                "{} updated, {} unchanged in {}ms",
                report.updated.len(),
                report.unchanged.len(),
                report.elapsed_ms
            );
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::LockBusy) => ExitCode::SUCCESS,
        Err(e) => fail(&e.to_string(), exit_code_for(&e)),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr; stdout carries only the pass summary.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn fail(msg: &str, code: ExitCode) -> ExitCode {
    tracing::error!("{msg}");
    eprintln!("ERROR: {msg}");
    code
}

/// Filesystem failures exit with their errno; everything else is
/// EX_UNAVAILABLE. Config problems never reach this point.
fn exit_code_for(e: &SyncError) -> ExitCode {
    match e {
        SyncError::Io { source, .. } => match source.raw_os_error() {
            Some(errno) => u8::try_from(errno)
                .map(ExitCode::from)
                .unwrap_or(ExitCode::from(EX_UNAVAILABLE)),
            None => ExitCode::from(EX_UNAVAILABLE),
        },
        _ => ExitCode::from(EX_UNAVAILABLE),
    }
}
