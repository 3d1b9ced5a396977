//! Install root lock
//!
//! Provides exclusive locking so two runs never extract into the same root
//! at the same time.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Lock file name inside the install root. Starts with "." like package
/// metadata, so it never collides with an extracted entry.
pub const LOCK_FILE_NAME: &str = ".pkgfetch.lock";

/// Acquire an exclusive lock on an install root.
/// Returns a guard that releases the lock when dropped.
///
/// A lock file left behind by a process that died holds no lock and is
/// simply reused; the OS drops the lock with its holder.
pub fn acquire_root_lock(root: &Path) -> Result<RootLock> {
    let lock_path = root.join(LOCK_FILE_NAME);

    let lock_file = File::create(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(anyhow::anyhow!(
            "Install root '{}' is in use by another pkgfetch process",
            root.display()
        ));
    }

    Ok(RootLock {
        _file: lock_file,
        path: lock_path,
    })
}

/// RAII guard for the root lock - releases the lock and deletes the lock file when dropped
#[derive(Debug)]
pub struct RootLock {
    _file: File,
    path: PathBuf,
}

impl RootLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_acquired_successfully() {
        let dir = TempDir::new().unwrap();
        let lock = acquire_root_lock(dir.path()).unwrap();
        assert!(lock.path().exists());
        assert_eq!(lock.path(), dir.path().join(LOCK_FILE_NAME));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        {
            let _lock = acquire_root_lock(dir.path()).unwrap();
            assert!(dir.path().join(LOCK_FILE_NAME).exists());
        }
        assert!(!dir.path().join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn test_concurrent_lock_blocked() {
        let dir = TempDir::new().unwrap();
        let _lock1 = acquire_root_lock(dir.path()).unwrap();
        let lock2 = acquire_root_lock(dir.path());
        assert!(lock2.is_err());
        assert!(lock2.unwrap_err().to_string().contains("in use"));
    }

    #[test]
    fn test_leftover_lock_file_is_reused() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(LOCK_FILE_NAME), b"").unwrap();

        let lock = acquire_root_lock(dir.path()).unwrap();
        assert!(lock.path().exists());
    }

    #[test]
    fn test_held_lock_file_survives_failed_attempt() {
        let dir = TempDir::new().unwrap();
        let _held = acquire_root_lock(dir.path()).unwrap();

        assert!(acquire_root_lock(dir.path()).is_err());
        assert!(dir.path().join(LOCK_FILE_NAME).exists());
        assert!(acquire_root_lock(dir.path()).is_err());
    }

    #[test]
    fn test_lock_in_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let result = acquire_root_lock(&dir.path().join("missing"));
        assert!(result.is_err());
    }
}
