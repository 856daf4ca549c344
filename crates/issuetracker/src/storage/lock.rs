//! Advisory file locking for the JSON store.
//!
//! Every mutation of the JSON store runs under an exclusive lock on
//! `data/.lock`; reads take a shared lock so they never observe an issue file
//! and the index out of step. Locks are per open file description, so they
//! serialize threads of one server process as well as separate processes.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt as Fs4FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

impl LockMode {
    fn describe(self) -> &'static str {
        match self {
            LockMode::Shared => "shared",
            LockMode::Exclusive => "exclusive",
        }
    }
}

/// Held lock; released when dropped.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Path of the locked file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = Fs4FileExt::unlock(&self.file);
    }
}

/// Acquires advisory locks with a bounded wait.
#[derive(Debug, Clone)]
pub struct FileLocker {
    timeout: Duration,
}

impl FileLocker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Acquire an exclusive (write) lock, waiting up to the timeout.
    ///
    /// # Errors
    ///
    /// Fails if the lock file cannot be opened or the lock is still held by
    /// someone else when the timeout expires.
    pub fn lock_exclusive(&self, path: &Path) -> Result<LockGuard> {
        self.acquire(path, LockMode::Exclusive)
    }

    /// Acquire a shared (read) lock, waiting up to the timeout.
    ///
    /// # Errors
    ///
    /// Same as [`FileLocker::lock_exclusive`].
    pub fn lock_shared(&self, path: &Path) -> Result<LockGuard> {
        self.acquire(path, LockMode::Shared)
    }

    fn acquire(&self, path: &Path, mode: LockMode) -> Result<LockGuard> {
        let file = open_or_create(path)?;
        let start = Instant::now();

        loop {
            let attempt = match mode {
                LockMode::Shared => Fs4FileExt::try_lock_shared(&file),
                LockMode::Exclusive => Fs4FileExt::try_lock_exclusive(&file),
            };

            match attempt {
                Ok(true) => {
                    return Ok(LockGuard {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Ok(false) => {
                    if start.elapsed() >= self.timeout {
                        anyhow::bail!(
                            "Lock timeout: could not acquire {} lock on {} after {:?}",
                            mode.describe(),
                            path.display(),
                            self.timeout
                        );
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    anyhow::bail!("IO error while trying to lock {}: {}", path.display(), e);
                }
            }
        }
    }
}

fn open_or_create(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_exclusive_lock_acquired() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".lock");

        let locker = FileLocker::new(Duration::from_millis(100));
        let guard = locker.lock_exclusive(&lock_path).unwrap();

        assert_eq!(guard.path(), lock_path);
        assert!(lock_path.exists());
    }

    #[test]
    fn test_lock_released_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".lock");
        let locker = FileLocker::new(Duration::from_millis(100));

        {
            let _guard = locker.lock_exclusive(&lock_path).unwrap();
        }

        let _again = locker.lock_exclusive(&lock_path).unwrap();
    }

    #[test]
    fn test_exclusive_lock_times_out_while_held() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".lock");

        let holder = FileLocker::new(Duration::from_millis(100));
        let _guard = holder.lock_exclusive(&lock_path).unwrap();

        let path = lock_path.clone();
        let result = thread::spawn(move || {
            FileLocker::new(Duration::from_millis(50)).lock_exclusive(&path)
        })
        .join()
        .unwrap();

        let err = result.unwrap_err().to_string();
        assert!(err.contains("Lock timeout"));
        assert!(err.contains("exclusive"));
    }

    #[test]
    fn test_shared_lock_blocks_writer() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".lock");

        let reader = FileLocker::new(Duration::from_millis(100));
        let _guard = reader.lock_shared(&lock_path).unwrap();

        let writer = FileLocker::new(Duration::from_millis(30));
        assert!(writer.lock_exclusive(&lock_path).is_err());
    }

    #[test]
    fn test_shared_locks_allow_concurrent_reads() {
        let temp_dir = TempDir::new().unwrap();
        let path = Arc::new(temp_dir.path().join(".lock"));
        let barrier = Arc::new(Barrier::new(3));
        let acquired = Arc::new(Mutex::new(0));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let path = Arc::clone(&path);
                let barrier = Arc::clone(&barrier);
                let acquired = Arc::clone(&acquired);

                thread::spawn(move || {
                    barrier.wait();
                    let locker = FileLocker::new(Duration::from_millis(500));
                    if let Ok(_guard) = locker.lock_shared(&path) {
                        thread::sleep(Duration::from_millis(50));
                        *acquired.lock().unwrap() += 1;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*acquired.lock().unwrap(), 3);
    }
}
