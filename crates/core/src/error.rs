//! Error types for the invalidation router
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The router itself never raises user-visible errors: malformed events and
//! masked payload fields are handled as no-ops, and per-key cache failures
//! are logged and skipped. The types here cover construction-time problems
//! (bad configuration) and the cache collaborator's failure surface.

use std::io;
use thiserror::Error;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for router construction and teardown
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (worker thread spawn, config file access)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Configuration rejected at construction time
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Cache collaborator failure, carried when a caller wants the cause
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Failure surface of the external cache collaborator
///
/// These are never propagated back to the notification source; the
/// dispatcher logs them and moves on to the next key in the batch.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The cache is unreachable or refused the call
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// The cache rejected this specific key
    #[error("invalidation rejected for key {key}: {reason}")]
    Rejected {
        /// Rendered form of the rejected key
        key: String,
        /// Collaborator-supplied reason
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::WouldBlock, "spawn failed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_display_invalid_config() {
        let err = Error::InvalidConfig("suppression window must be non-zero".to_string());
        let msg = err.to_string();
        assert!(msg.contains("invalid configuration"));
        assert!(msg.contains("non-zero"));
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::Rejected {
            key: "students/S1".to_string(),
            reason: "store closed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("students/S1"));
        assert!(msg.contains("store closed"));
    }

    #[test]
    fn test_error_from_cache_error() {
        let err: Error = CacheError::Unavailable("connection reset".to_string()).into();
        assert!(matches!(err, Error::Cache(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_result_type_alias() {
        fn ok() -> Result<u32> {
            Ok(7)
        }
        fn fails() -> Result<u32> {
            Err(Error::InvalidConfig("bad".to_string()))
        }
        assert_eq!(ok().unwrap(), 7);
        assert!(fails().is_err());
    }
}
