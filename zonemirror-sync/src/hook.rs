//! Post-sync hook.
//!
//! Runs the configured `postcommand` after a pass that wrote at least one
//! file, typically to reload the nameserver. The hook is advisory: failures
//! are logged, never propagated, so a broken reload command cannot fail an
//! otherwise successful mirror pass.

use std::process::Command;

/// Run `argv` to completion, logging the outcome.
pub fn run_post_command(argv: &[String]) {
    let Some((program, args)) = argv.split_first() else {
        tracing::warn!("postcommand is empty, skipping");
        return;
    };
    tracing::info!("running postcommand: {}", argv.join(" "));
    match Command::new(program).args(args).status() {
        Ok(status) if status.success() => {
            tracing::debug!("postcommand finished");
        }
        Ok(status) => {
            tracing::warn!("postcommand exited with {status}");
        }
        Err(e) => {
            tracing::warn!("could not run postcommand '{program}': {e}");
        }
    }
}
