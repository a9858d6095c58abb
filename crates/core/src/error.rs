//! Error types for the refsearch workspace
//!
//! One enum for the whole workspace, built with `thiserror`. Storage I/O
//! failures propagate untouched; everything else carries enough context for
//! the calling repository layer to translate into an API-level response.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for refsearch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the index engine and its collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the index store (disk full, permission denied, ...)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Snapshot encode/decode failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Another writer holds the index directory
    #[error("index store at '{}' is held by another writer", .path.display())]
    StoreLocked {
        /// The contested index directory
        path: PathBuf,
    },

    /// Snapshot failed validation (bad magic, unsupported version, truncation)
    #[error("index corruption: {0}")]
    Corruption(String),

    /// Operation on a handle that has already been closed
    #[error("index handle is closed")]
    Closed,

    /// Failure reported by the system-of-record during a rebuild
    #[error("reference source error: {0}")]
    Source(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
    }

    #[test]
    fn test_error_display_serialization() {
        let err = Error::Serialization("invalid format".to_string());
        let msg = err.to_string();
        assert!(msg.contains("serialization error"));
        assert!(msg.contains("invalid format"));
    }

    #[test]
    fn test_error_display_store_locked() {
        let err = Error::StoreLocked {
            path: PathBuf::from("/tmp/data/index"),
        };
        let msg = err.to_string();
        assert!(msg.contains("held by another writer"));
        assert!(msg.contains("/tmp/data/index"));
    }

    #[test]
    fn test_error_display_corruption() {
        let err = Error::Corruption("bad snapshot magic".to_string());
        let msg = err.to_string();
        assert!(msg.contains("index corruption"));
        assert!(msg.contains("bad snapshot magic"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }

        fn returns_error() -> Result<i32> {
            Err(Error::Closed)
        }

        assert_eq!(returns_result().unwrap(), 42);
        assert!(returns_error().is_err());
    }
}
