//! Error types for lock operations.
//!
//! Uses thiserror for derive macros. Acquisition failures are split into two
//! distinct kinds so callers can tell contention (retryable) apart from
//! filesystem problems (not retryable).

use thiserror::Error;

/// Main error type for lock operations.
///
/// `AcquisitionTimeout` and `AcquisitionFailed` are deliberately separate
/// variants: a timeout means the lock was simply held by someone else for the
/// whole wait, while a failure means the marker file could not be created at
/// all (permissions, missing directory, I/O error). Callers typically retry
/// or back off on the former and abort on the latter.
#[derive(Error, Debug)]
pub enum LockError {
    /// The lock could not be obtained within the configured timeout.
    #[error("lock acquisition timed out: {0}")]
    AcquisitionTimeout(String),

    /// A non-contention filesystem error occurred while creating the marker
    /// file. Not retried internally.
    #[error("lock acquisition failed: {0}")]
    AcquisitionFailed(String),

    /// The marker file could not be deleted for a reason other than it being
    /// already absent.
    #[error("lock release failed: {0}")]
    ReleaseFailed(String),

    /// A normal release found the marker file already gone despite the lock
    /// being held. Something else removed it.
    #[error("lock integrity violated: {0}")]
    ReleaseIntegrity(String),

    /// Lock-file metadata could not be read, parsed, or serialized.
    #[error("lock metadata error: {0}")]
    Metadata(String),
}

/// Result type alias for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_and_failed_are_distinct_variants() {
        let timeout = LockError::AcquisitionTimeout("waited 500ms".to_string());
        let failed = LockError::AcquisitionFailed("permission denied".to_string());

        assert!(matches!(timeout, LockError::AcquisitionTimeout(_)));
        assert!(matches!(failed, LockError::AcquisitionFailed(_)));
        assert!(!matches!(timeout, LockError::AcquisitionFailed(_)));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let err = LockError::AcquisitionTimeout("gave up on 'db.lock'".to_string());
        assert_eq!(
            err.to_string(),
            "lock acquisition timed out: gave up on 'db.lock'"
        );

        let err = LockError::ReleaseIntegrity("'db.lock' vanished".to_string());
        assert_eq!(err.to_string(), "lock integrity violated: 'db.lock' vanished");
    }

    #[test]
    fn test_release_errors_carry_detail() {
        let err = LockError::ReleaseFailed("permission denied".to_string());
        assert!(err.to_string().contains("permission denied"));

        let err = LockError::Metadata("invalid JSON".to_string());
        assert!(err.to_string().contains("invalid JSON"));
    }
}
