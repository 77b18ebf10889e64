//! The exclusive lock type and its acquisition/release protocol.

use crate::error::{LockError, Result};
use crate::guard::LockGuard;
use crate::metadata::LockMetadata;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Default maximum time `acquire` waits for a contended lock.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between failed acquisition attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Suffix appended to the resource name to form the marker-file name.
pub const LOCK_SUFFIX: &str = ".lock";

/// An exclusive advisory lock on a named resource, backed by a marker file.
///
/// Two locks contend if and only if they resolve to the same marker path:
/// `<base_dir>/<resource>.lock`. Exclusivity rests entirely on atomic
/// **create_new** file creation: exactly one of any number of racing
/// processes observes success; the rest see "already exists" and poll.
/// No OS-level file locking is involved, so this works on any filesystem
/// where exclusive create is atomic (local disks, POSIX-coherent mounts).
///
/// The lock is advisory: it only excludes other cooperating `FileLock`
/// users (or anything else that honors the marker file). Do not construct
/// two instances for the same path within one process; the marker file
/// cannot tell them apart, and this type does not police it.
#[derive(Debug)]
pub struct FileLock {
    /// The protected resource name.
    resource: String,

    /// Derived marker-file path: `<base_dir>/<resource>.lock`.
    path: PathBuf,

    /// Maximum total time `acquire` waits for a contended lock.
    timeout: Duration,

    /// Pause between failed acquisition attempts.
    retry_delay: Duration,

    /// Whether this instance currently holds the lock.
    held: bool,

    /// Open handle to the marker file; `Some` exactly while `held`.
    handle: Option<File>,
}

impl FileLock {
    /// Create a lock for `resource` with the marker file placed in the
    /// process current working directory.
    ///
    /// The working directory is resolved once, here; changing it afterwards
    /// does not move the marker path. Construction does no marker-file I/O.
    ///
    /// # Errors
    ///
    /// Fails with [`LockError::AcquisitionFailed`] when the working
    /// directory cannot be resolved (the marker path cannot be derived, so
    /// no acquisition could ever succeed).
    pub fn new(resource: impl Into<String>) -> Result<Self> {
        let base = env::current_dir().map_err(|e| {
            LockError::AcquisitionFailed(format!(
                "failed to resolve current working directory: {}",
                e
            ))
        })?;

        Ok(Self::in_dir(base, resource))
    }

    /// Create a lock for `resource` with the marker file placed in `base`.
    ///
    /// The base directory must already exist by the time `acquire` runs; it
    /// is never created implicitly.
    pub fn in_dir(base: impl AsRef<Path>, resource: impl Into<String>) -> Self {
        let resource = resource.into();
        let path = base.as_ref().join(format!("{}{}", resource, LOCK_SUFFIX));

        Self {
            resource,
            path,
            timeout: DEFAULT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
            held: false,
            handle: None,
        }
    }

    /// Set the maximum total time `acquire` waits for a contended lock.
    ///
    /// A zero timeout still makes one creation attempt, so an uncontended
    /// acquire succeeds; a contended one fails immediately.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pause between failed acquisition attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Path of the marker file this lock contends for.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The protected resource name.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Whether this instance currently holds the lock.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Acquire the lock, waiting up to the configured timeout.
    ///
    /// Repeatedly attempts to create the marker file with exclusive
    /// **create_new** semantics, a single atomic filesystem operation that
    /// fails if the file already exists. While the file exists, the call
    /// sleeps for the retry delay and tries again until the elapsed time
    /// reaches the timeout, then fails with
    /// [`LockError::AcquisitionTimeout`]. Any creation error other than
    /// "already exists" is not contention and fails immediately with
    /// [`LockError::AcquisitionFailed`], without retrying.
    ///
    /// Calling this while the lock is already held by this instance is a
    /// no-op returning `Ok(())`.
    ///
    /// On failure the filesystem is left untouched: the base directory is
    /// never created implicitly, and a marker file whose metadata could not
    /// be written is removed again.
    pub fn acquire(&mut self) -> Result<()> {
        if self.held {
            return Ok(());
        }

        let start = Instant::now();

        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.path)
            {
                Ok(file) => {
                    let file = self.stamp(file)?;
                    self.handle = Some(file);
                    self.held = true;
                    return Ok(());
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    // Retry while elapsed < timeout; give up only once the
                    // full timeout has been spent waiting.
                    if start.elapsed() >= self.timeout {
                        return Err(self.timeout_error(start.elapsed()));
                    }
                    thread::sleep(self.retry_delay);
                }
                Err(e) => {
                    return Err(LockError::AcquisitionFailed(format!(
                        "failed to create lock file '{}': {}",
                        self.path.display(),
                        e
                    )));
                }
            }
        }
    }

    /// Release the lock.
    ///
    /// Closes the handle and deletes the marker file. Calling this while the
    /// lock is not held is a no-op returning `Ok(())`. If the marker file
    /// has already vanished (someone force-released it or deleted it by
    /// hand), exclusivity was compromised while we believed we held it, and
    /// the call fails with [`LockError::ReleaseIntegrity`].
    ///
    /// After this returns, even with an error, the instance no longer
    /// considers itself the holder: the handle is closed either way. A
    /// failed deletion leaves an orphaned marker behind that
    /// [`FileLock::force_release`] can remove.
    pub fn release(&mut self) -> Result<()> {
        if !self.held {
            return Ok(());
        }

        // Close the handle before deleting. The held state is gone from this
        // point no matter how the deletion goes.
        self.handle = None;
        self.held = false;

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LockError::ReleaseIntegrity(format!(
                    "lock file '{}' was already gone at release; another process removed it",
                    self.path.display()
                )))
            }
            Err(e) => Err(LockError::ReleaseFailed(format!(
                "failed to remove lock file '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Unconditionally remove the marker file, whether or not this instance
    /// holds the lock.
    ///
    /// This is an operator tool for recovering from a crashed holder. It can
    /// just as easily destroy a live lock held by another process, so
    /// inspect [`FileLock::holder`] before reaching for it. An
    /// already-absent marker file is a benign outcome and returns `Ok(())`;
    /// any other deletion error is surfaced as
    /// [`LockError::ReleaseFailed`].
    pub fn force_release(&mut self) -> Result<()> {
        self.handle = None;
        self.held = false;

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LockError::ReleaseFailed(format!(
                "failed to remove lock file '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Read the metadata of whoever currently holds the marker file.
    ///
    /// Returns `None` when no marker file exists, and also when one exists
    /// but does not contain this crate's metadata. Lock files created by
    /// other software may contain anything, and that must not break
    /// inspection.
    pub fn holder(&self) -> Option<LockMetadata> {
        LockMetadata::from_file(&self.path).ok()
    }

    /// Acquire the lock and return a guard that releases it when dropped.
    ///
    /// This is the recommended way to hold the lock: the guard releases on
    /// every exit path (normal return, `?` propagation, early return, panic
    /// unwind) without the caller having to remember. Use
    /// [`LockGuard::release`] to surface release errors instead of having
    /// them logged on drop.
    pub fn guard(&mut self) -> Result<LockGuard<'_>> {
        self.acquire()?;
        Ok(LockGuard::new(self))
    }

    /// Run `f` while holding the lock.
    ///
    /// Acquires, runs the closure, then releases; release errors propagate.
    /// If `f` panics, the lock is still released while the panic unwinds.
    pub fn scoped<T>(&mut self, f: impl FnOnce() -> T) -> Result<T> {
        let guard = self.guard()?;
        let value = f();
        guard.release()?;
        Ok(value)
    }

    /// Write holder metadata into a freshly created marker file.
    ///
    /// On any failure the marker is removed again so the failed acquisition
    /// leaves nothing behind.
    fn stamp(&self, mut file: File) -> Result<File> {
        let json = match LockMetadata::new(&self.resource).to_json() {
            Ok(json) => json,
            Err(e) => {
                let _ = fs::remove_file(&self.path);
                return Err(e);
            }
        };

        file.write_all(json.as_bytes()).map_err(|e| {
            let _ = fs::remove_file(&self.path);
            LockError::AcquisitionFailed(format!(
                "failed to write lock metadata to '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        file.sync_all().map_err(|e| {
            let _ = fs::remove_file(&self.path);
            LockError::AcquisitionFailed(format!(
                "failed to sync lock file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(file)
    }

    /// Build the timeout error, naming the current holder when its metadata
    /// is readable.
    fn timeout_error(&self, waited: Duration) -> LockError {
        let holder = match LockMetadata::from_file(&self.path) {
            Ok(meta) => format!(" (held by {} for {})", meta.owner, meta.age_string()),
            Err(_) => String::new(),
        };

        LockError::AcquisitionTimeout(format!(
            "gave up waiting for lock '{}' after {:?}{}",
            self.path.display(),
            waited,
            holder
        ))
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Best-effort net for instances discarded while held. Explicit
        // release or a guard is the reliable path; drop never runs if the
        // process is killed or the value is leaked.
        if self.held
            && let Err(e) = self.release()
        {
            tracing::warn!(
                error = %e,
                lock = %self.path.display(),
                "failed to release lock while dropping a held lock"
            );
        }
    }
}
