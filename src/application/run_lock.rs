//! Run Lock
//!
//! Serializes bot runs the way the hosted scheduler used to: at most one
//! transaction-sending run at a time, later invocations fail fast instead
//! of queueing behind a swap in flight. Implemented as a lock file holding
//! the owner's PID; a lock left behind by a dead process is reclaimed.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Another run is already in progress (lock {path}, pid {pid:?})")]
    Held { path: PathBuf, pid: Option<u32> },
    #[error("Failed to manage lock file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Exclusive lock over the lock file path; released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock, reclaiming it if the recorded owner is dead.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        match Self::try_create(path) {
            Ok(lock) => Ok(lock),
            Err(LockError::Held { pid, .. }) => {
                if let Some(owner) = pid {
                    if !process_alive(owner) {
                        tracing::warn!(pid = owner, "Reclaiming stale run lock");
                        fs::remove_file(path).map_err(|source| LockError::Io {
                            path: path.to_path_buf(),
                            source,
                        })?;
                        return Self::try_create(path);
                    }
                }
                Err(LockError::Held {
                    path: path.to_path_buf(),
                    pid,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn try_create(path: &Path) -> Result<Self, LockError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                let pid = std::process::id();
                write!(file, "{pid}").map_err(|source| LockError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), pid, "Run lock acquired");
                Ok(Self {
                    path: path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let pid = fs::read_to_string(path)
                    .ok()
                    .and_then(|s| s.trim().parse::<u32>().ok());
                Err(LockError::Held {
                    path: path.to_path_buf(),
                    pid,
                })
            }
            Err(source) => Err(LockError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove run lock");
        }
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    // No cheap liveness check; treat the lock as held
    true
}
