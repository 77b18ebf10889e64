//! RAII scoped-acquisition guard.

use crate::error::Result;
use crate::lock::FileLock;
use std::path::Path;

/// Guard for a held [`FileLock`].
///
/// When dropped, the lock is released automatically, on every exit path of
/// the enclosing scope. If the release fails during drop, a warning is
/// logged but no panic occurs; call [`LockGuard::release`] instead to
/// handle release errors explicitly.
#[derive(Debug)]
pub struct LockGuard<'a> {
    /// The lock this guard holds.
    lock: &'a mut FileLock,

    /// Whether the lock has been released manually.
    released: bool,
}

impl<'a> LockGuard<'a> {
    /// Create a new guard for a lock that was just acquired.
    pub(crate) fn new(lock: &'a mut FileLock) -> Self {
        Self {
            lock,
            released: false,
        }
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        self.lock.path()
    }

    /// Release the lock before the guard goes out of scope.
    ///
    /// This is useful when you want to shorten the critical section, or
    /// want release errors surfaced instead of logged.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.lock.release()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.lock.release()
        {
            tracing::warn!(
                error = %e,
                lock = %self.lock.path().display(),
                "failed to release lock on scope exit"
            );
        }
    }
}
