//! The mirror pass.
//!
//! ## `run`: one pass, start to finish
//!
//! 1. Ensure the destination and work directories exist.
//! 2. Take the non-blocking run lock; a held lock ends the pass immediately.
//! 3. Fetch the upstream zone inventory (forward + reverse merged).
//! 4. For every configured zone, in name order: decide from the stored
//!    state whether its zonefile must be fetched, then fetch, write, and
//!    persist fresh state for the ones that do.
//! 5. A configured zone missing upstream aborts the pass.
//! 6. Run the postcommand once if anything was written.
//!
//! `force` skips the decision and fetches everything; `dry_run` decides and
//! logs but leaves disk, state, and the postcommand untouched.

use std::time::Instant;

use zonemirror_core::{Config, ZoneName};
use zonemirror_detector::should_update;
use zonemirror_mreg::ZoneSource;

use crate::error::{io_err, SyncError};
use crate::hook;
use crate::lock::ProcessLock;
use crate::observe::timed;
use crate::state;
use crate::writer;

// ---------------------------------------------------------------------------
// Options and outcome
// ---------------------------------------------------------------------------

/// Knobs for one pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Fetch every zone regardless of what the stored state says.
    pub force: bool,
    /// Decide and log, but do not touch disk or run the postcommand.
    pub dry_run: bool,
}

/// How a pass ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Another run holds the lock; nothing was done.
    LockBusy,
    /// The pass ran to completion.
    Completed(RunReport),
}

/// What one completed pass did.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Zones written (or, in dry-run, zones that would have been written).
    pub updated: Vec<String>,
    /// Zones skipped as unchanged.
    pub unchanged: Vec<String>,
    /// Whether the postcommand ran.
    pub hook_invoked: bool,
    pub elapsed_ms: u64,
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Run one mirror pass against `source` as configured by `config`.
pub fn run<S: ZoneSource>(
    config: &Config,
    source: &S,
    opts: RunOptions,
) -> Result<RunOutcome, SyncError> {
    let started = Instant::now();
    let destdir = &config.default.destdir;
    let workdir = &config.default.workdir;

    std::fs::create_dir_all(destdir).map_err(|e| io_err(destdir, e))?;
    std::fs::create_dir_all(workdir).map_err(|e| io_err(workdir, e))?;

    let lock_path = workdir.join("lockfile");
    let Some(_lock) = ProcessLock::try_acquire(&lock_path)? else {
        tracing::warn!("could not lock on {}", lock_path.display());
        return Ok(RunOutcome::LockBusy);
    };

    let inventory = timed("zone inventory fetch", || source.zone_inventory())?;
    tracing::debug!("{} zones upstream", inventory.len());

    let mut report = RunReport::default();

    for zone in config.zones.keys() {
        let Some(current) = inventory.get(zone) else {
            return Err(SyncError::ZoneMissing { zone: zone.clone() });
        };
        let filename = config.zone_filename(zone);
        let previous = state::load_zone_state(workdir, filename);
        let decision = should_update(previous.as_ref(), current);
        tracing::info!("{zone}: {decision}");

        if !decision.fetch_needed() && !opts.force {
            report.unchanged.push(zone.clone());
            continue;
        }
        if opts.dry_run {
            tracing::info!("[dry-run] would fetch and write {filename}");
            report.updated.push(zone.clone());
            continue;
        }
        sync_zone(config, source, zone, filename)?;
        report.updated.push(zone.clone());
    }

    if !report.updated.is_empty() && !opts.dry_run {
        if let Some(postcommand) = &config.default.postcommand {
            hook::run_post_command(postcommand);
            report.hook_invoked = true;
        }
    }

    report.elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        "pass complete: {} updated, {} unchanged in {}ms",
        report.updated.len(),
        report.unchanged.len(),
        report.elapsed_ms
    );
    Ok(RunOutcome::Completed(report))
}

// ---------------------------------------------------------------------------
// sync_zone
// ---------------------------------------------------------------------------

fn sync_zone<S: ZoneSource>(
    config: &Config,
    source: &S,
    zone: &str,
    filename: &str,
) -> Result<(), SyncError> {
    let zone_name = ZoneName::from(zone);
    let body = timed("zonefile fetch", || source.zonefile(&zone_name))?;
    let fresh = source.zone_summary(&zone_name)?;

    // Serials are YYYYMMDDnn; nn stops at 99 until the date rolls over.
    if fresh.serialno % 100 == 99 {
        tracing::warn!("{zone} reached max serial (99)");
    }

    let extra = match &config.default.extradir {
        Some(extradir) => writer::read_extra_data(extradir, filename)?,
        None => None,
    };

    // Zonefile bodies are written as UTF-8 exactly as served; the configured
    // fileencoding applies to text artifacts only.
    writer::write_zonefile(
        &config.default.destdir,
        filename,
        body.as_bytes(),
        extra.as_deref(),
    )?;
    state::save_zone_state(&config.default.workdir, filename, &fresh)?;
    Ok(())
}
