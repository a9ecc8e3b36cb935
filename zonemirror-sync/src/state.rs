//! State store: JSON snapshots of upstream metadata between runs.
//!
//! One document per mirrored file under the work directory:
//! `<workdir>/<filename>.json` holds the zone metadata recorded after the
//! last successful write, or the first listing page for a listing check.
//! Writes use a `.tmp` sibling + rename so a crash never leaves a torn
//! snapshot behind.
//!
//! Loads are deliberately forgiving: an absent, unreadable, or corrupt
//! snapshot logs a warning and reports "no previous state", which makes
//! the next pass treat the file as a first run. Saves are fatal on
//! failure, since silently losing state would re-fetch everything forever.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use zonemirror_core::{ListingPage, ZoneSummary};

use crate::error::{io_err, SyncError};

/// Path of the state snapshot for `filename`, rooted at `workdir`.
///
/// `<workdir>/<filename>.json`
pub fn state_path(workdir: &Path, filename: &str) -> PathBuf {
    workdir.join(format!("{filename}.json"))
}

fn load_state<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("no previous state at {}", path.display());
            return None;
        }
        Err(e) => {
            tracing::warn!("could not read state at {}: {e}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("could not parse state at {}: {e}", path.display());
            None
        }
    }
}

fn save_state<T: Serialize>(path: &Path, value: &T) -> Result<(), SyncError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid state path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Load the zone metadata snapshot for `filename`, if one exists.
pub fn load_zone_state(workdir: &Path, filename: &str) -> Option<ZoneSummary> {
    load_state(&state_path(workdir, filename))
}

/// Save the zone metadata snapshot for `filename` atomically.
pub fn save_zone_state(
    workdir: &Path,
    filename: &str,
    summary: &ZoneSummary,
) -> Result<(), SyncError> {
    save_state(&state_path(workdir, filename), summary)
}

/// Load the listing snapshot stored under `name`, if one exists.
pub fn load_listing_state(workdir: &Path, name: &str) -> Option<ListingPage> {
    load_state(&state_path(workdir, name))
}

/// Save the listing snapshot stored under `name` atomically.
pub fn save_listing_state(workdir: &Path, name: &str, page: &ListingPage) -> Result<(), SyncError> {
    save_state(&state_path(workdir, name), page)
}
