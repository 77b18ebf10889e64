//! Diagnostic metadata written into lock files.
//!
//! The locking protocol only cares about the marker file's existence; the
//! JSON payload exists so a human (or `FileLock::holder`) can see who is
//! holding a lock and for how long before deciding to force-release it.
//! Lock files created by other software may contain anything at all, so
//! nothing in the crate requires this payload to be present or parseable.

use crate::error::{LockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Metadata stored in lock files created by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Owner of the lock (e.g., `user@HOST`).
    pub owner: String,

    /// Process ID of the lock holder (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Timestamp when the lock was acquired (RFC3339).
    pub acquired_at: DateTime<Utc>,

    /// The resource name the lock protects.
    pub resource: String,
}

impl LockMetadata {
    /// Create new lock metadata for the current process with the current
    /// timestamp.
    pub fn new(resource: &str) -> Self {
        Self {
            owner: get_owner_string(),
            pid: Some(std::process::id()),
            acquired_at: Utc::now(),
            resource: resource.to_string(),
        }
    }

    /// Parse lock metadata from a lock file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            LockError::Metadata(format!(
                "failed to read lock file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            LockError::Metadata(format!(
                "failed to parse lock file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Serialize lock metadata to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LockError::Metadata(format!("failed to serialize lock metadata: {}", e)))
    }

    /// Calculate the age of the lock.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.acquired_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }

    /// Check whether the lock is older than the given threshold.
    ///
    /// A lock far older than its expected hold time usually belongs to a
    /// crashed process and is a candidate for [`FileLock::force_release`].
    ///
    /// [`FileLock::force_release`]: crate::FileLock::force_release
    pub fn is_stale(&self, threshold: Duration) -> bool {
        // A clock-skewed (negative) age is never stale.
        self.age().to_std().map(|age| age >= threshold).unwrap_or(false)
    }
}

/// Get the owner string for lock metadata.
pub(crate) fn get_owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}
