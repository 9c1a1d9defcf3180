use crate::core::error::StoreError;
use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const LOCK_FILE: &str = "aurum.lock";
const LOCK_POLL: Duration = Duration::from_millis(25);

/// Exclusive claim on a data directory, held for as long as any handle into
/// the keyspace is alive. The OS drops it when the file is closed, so a
/// crashed process never leaves the directory locked.
#[derive(Debug)]
pub struct DataDirLock {
    _file: File,
    path: PathBuf,
}

impl DataDirLock {
    /// Takes the lock on `dir`, waiting up to `wait` for another process (or
    /// another `Storage` in this one) to let go of it.
    pub fn acquire(dir: &Path, wait: Duration) -> Result<Self, StoreError> {
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| {
                StoreError::Unavailable(format!("cannot open {}: {e}", path.display()))
            })?;

        let deadline = Instant::now() + wait;
        let mut announced = false;
        loop {
            match file.try_lock() {
                Ok(()) => {
                    debug!("Locked data directory {}", dir.display());
                    return Ok(Self { _file: file, path });
                }
                Err(TryLockError::WouldBlock) if Instant::now() < deadline => {
                    if !announced {
                        info!("Data directory {} is busy, waiting", dir.display());
                        announced = true;
                    }
                    std::thread::sleep(LOCK_POLL);
                }
                Err(TryLockError::WouldBlock) => {
                    return Err(StoreError::Locked(dir.display().to_string()));
                }
                Err(TryLockError::Error(e)) => {
                    return Err(StoreError::Unavailable(format!(
                        "cannot lock {}: {e}",
                        path.display()
                    )));
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_lock_times_out() {
        let dir = tempdir().unwrap();
        let held = DataDirLock::acquire(dir.path(), Duration::ZERO).unwrap();
        assert!(held.path().ends_with(LOCK_FILE));

        let started = Instant::now();
        let err = DataDirLock::acquire(dir.path(), Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, StoreError::Locked(_)));
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_lock_is_released_on_drop() {
        let dir = tempdir().unwrap();
        let held = DataDirLock::acquire(dir.path(), Duration::ZERO).unwrap();
        drop(held);
        assert!(DataDirLock::acquire(dir.path(), Duration::ZERO).is_ok());
    }

    #[test]
    fn test_waiter_gets_lock_once_released() {
        let dir = tempdir().unwrap();
        let held = DataDirLock::acquire(dir.path(), Duration::ZERO).unwrap();

        let path = dir.path().to_path_buf();
        let waiter = std::thread::spawn(move || {
            DataDirLock::acquire(&path, Duration::from_secs(10)).is_ok()
        });
        std::thread::sleep(Duration::from_millis(200));
        assert!(!waiter.is_finished());

        drop(held);
        assert!(waiter.join().unwrap());
    }
}
