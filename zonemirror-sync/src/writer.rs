//! Staged file writer for mirrored zonefiles and text artifacts.
//!
//! ## `write_zonefile`: 4-step protocol
//!
//! 1. Stage content (plus any extra data) into a private temp file inside
//!    the destination directory.
//! 2. Rotate: rename an existing `<name>` to `<name>_old`.
//! 3. Persist the staged file to `<name>` (atomic on POSIX; same filesystem
//!    by construction, the temp file lives next to its target).
//! 4. Drop write bits: the mirrored file ends up mode 0400.
//!
//! A failure in any step leaves the previous generation on disk, either
//! still at `<name>` or already rotated to `<name>_old`.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use zonemirror_core::FileEncoding;

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// write_zonefile
// ---------------------------------------------------------------------------

/// Write one mirrored file under `destdir`, appending `extra` if present.
///
/// Returns the final path on success.
pub fn write_zonefile(
    destdir: &Path,
    name: &str,
    content: &[u8],
    extra: Option<&[u8]>,
) -> Result<PathBuf, SyncError> {
    let path = destdir.join(name);

    // Step 1: stage everything before touching the current generation.
    let mut staged = NamedTempFile::new_in(destdir).map_err(|e| io_err(destdir, e))?;
    staged
        .write_all(content)
        .map_err(|e| io_err(staged.path(), e))?;
    if let Some(extra) = extra {
        staged
            .write_all(extra)
            .map_err(|e| io_err(staged.path(), e))?;
    }

    // Step 2: rotate the previous generation aside.
    if path.is_file() {
        let old = rotated_path(&path);
        std::fs::rename(&path, &old).map_err(|e| io_err(&path, e))?;
    }

    // Step 3: persist. On failure the temp file comes back in the error and
    // is deleted when dropped.
    staged.persist(&path).map_err(|e| io_err(&path, e.error))?;

    // Step 4: mirrored files are read-only until the next rotation.
    set_readonly(&path)?;

    tracing::info!("wrote: {}", path.display());
    Ok(path)
}

/// Encode `text` with the configured encoding and write it like a zonefile,
/// rotation and read-only mode included.
pub fn write_text_artifact(
    destdir: &Path,
    name: &str,
    text: &str,
    encoding: FileEncoding,
) -> Result<PathBuf, SyncError> {
    let bytes = encoding.encode(text)?;
    write_zonefile(destdir, name, &bytes, None)
}

/// `<path>_old`, keeping the full file name intact (`db.192.0` rotates to
/// `db.192.0_old`, not `db.192_old.0`).
fn rotated_path(path: &Path) -> PathBuf {
    let mut rotated = path.as_os_str().to_os_string();
    rotated.push("_old");
    PathBuf::from(rotated)
}

#[cfg(unix)]
fn set_readonly(path: &Path) -> Result<(), SyncError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o400))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_readonly(path: &Path) -> Result<(), SyncError> {
    let mut perms = std::fs::metadata(path)
        .map_err(|e| io_err(path, e))?
        .permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(path, perms).map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// Extra data
// ---------------------------------------------------------------------------

/// Read the site-local `<filename>_extra` payload from `extradir`.
///
/// A missing file is normal and reports `None`; any other read failure is
/// fatal, since silently dropping extra records would publish a truncated
/// zone.
pub fn read_extra_data(extradir: &Path, filename: &str) -> Result<Option<Vec<u8>>, SyncError> {
    let path = extradir.join(format!("{filename}_extra"));
    match std::fs::read(&path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(&path, e)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
