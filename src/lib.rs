//! Advisory file locking built on atomic lock-file creation.
//!
//! This crate provides mutual exclusion between independent processes that
//! share a filesystem path, using only the presence or absence of a marker
//! file as the coordination primitive. No OS-native locking (`flock`,
//! `fcntl`, mandatory locks) is involved, so it works anywhere exclusive
//! file creation is atomic: local filesystems and POSIX-coherent shared
//! mounts.
//!
//! # Lock Files
//!
//! Each [`FileLock`] protects one named resource through a marker file,
//! `<resource>.lock`, in a configurable base directory (default: the
//! process working directory at construction time). The file is created
//! with **create_new** semantics: a single atomic operation that fails if
//! the file already exists. Exactly one of any number of racing processes
//! acquires the lock; everyone else polls with a configurable retry delay
//! until a timeout expires.
//!
//! # Lock Metadata
//!
//! Lock files created by this crate contain JSON metadata:
//! - `owner`: the lock holder (e.g., `user@HOST`)
//! - `pid`: the process ID (optional)
//! - `acquired_at`: RFC3339 timestamp
//! - `resource`: the protected resource name
//!
//! The payload is diagnostic only. Correctness depends solely on the file's
//! existence; marker files written by anything else (with any contents)
//! contend correctly.
//!
//! # Guards and Cleanup
//!
//! Holding the lock through a [`LockGuard`] is the recommended pattern: the
//! guard releases on every scope exit path, including panics. Dropping a
//! held [`FileLock`] also performs a best-effort release, but that is a
//! safety net rather than the primary mechanism, and it cannot run if the
//! process is killed. A crashed holder leaves its marker file behind;
//! [`FileLock::force_release`] removes it once an operator has checked
//! [`FileLock::holder`].
//!
//! # Example
//!
//! ```no_run
//! use hasp::FileLock;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), hasp::LockError> {
//!     let mut lock = FileLock::new("db")?
//!         .with_timeout(Duration::from_secs(5))
//!         .with_retry_delay(Duration::from_millis(50));
//!
//!     {
//!         let _guard = lock.guard()?;
//!         // critical section: other processes wait at most 5 seconds here
//!     }
//!
//!     Ok(())
//! }
//! ```

mod error;
mod guard;
mod lock;
mod metadata;

#[cfg(test)]
mod test_support;

// Re-export public API
pub use error::{LockError, Result};
pub use guard::LockGuard;
pub use lock::{DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT, FileLock, LOCK_SUFFIX};
pub use metadata::LockMetadata;
