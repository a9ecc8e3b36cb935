//! Single-run process lock.
//!
//! A non-blocking `flock(LOCK_EX | LOCK_NB)` on a lockfile in the work
//! directory. The guard holds the file open; the OS releases the lock when
//! the descriptor closes, so a crashed run never leaves the lockfile wedged
//! and no unlink step is needed.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Guard for the exclusive run lock. Dropping it releases the lock.
pub struct ProcessLock {
    _file: File,
    path: PathBuf,
}

impl ProcessLock {
    /// Try to take the lock at `path` without blocking.
    ///
    /// `Ok(None)` means another process already holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<ProcessLock>, SyncError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| io_err(path, e))?;
        match try_flock_exclusive(&file) {
            Ok(true) => Ok(Some(ProcessLock {
                _file: file,
                path: path.to_path_buf(),
            })),
            Ok(false) => Ok(None),
            Err(e) => Err(io_err(path, e)),
        }
    }

    /// Path of the lockfile backing this guard.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for ProcessLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessLock")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Try to acquire an exclusive flock on a file (non-blocking).
///
/// Returns `Ok(true)` if the lock was acquired, `Ok(false)` if the file is
/// already locked elsewhere.
fn try_flock_exclusive(file: &File) -> io::Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        // SAFETY: fd is a valid descriptor owned by `file`; LOCK_EX | LOCK_NB
        // requests a non-blocking exclusive lock.
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if result == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EWOULDBLOCK)
        {
            return Ok(false);
        }
        Err(err)
    }
    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    #[cfg(unix)]
    fn second_acquire_is_denied_while_held() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lockfile");
        let held = ProcessLock::try_acquire(&path).unwrap();
        assert!(held.is_some());
        // A second open file description is denied even within one process.
        let second = ProcessLock::try_acquire(&path).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn drop_releases_the_lock() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lockfile");
        let held = ProcessLock::try_acquire(&path).unwrap();
        drop(held);
        assert!(ProcessLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn stale_lockfile_is_reacquirable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lockfile");
        std::fs::write(&path, "left behind by a dead run").unwrap();
        let lock = ProcessLock::try_acquire(&path).unwrap().unwrap();
        assert_eq!(lock.path(), path);
    }
}
