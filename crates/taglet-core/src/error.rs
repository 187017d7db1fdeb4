//! Error types for Taglet core operations.
//!
//! This module defines well-structured error types using `thiserror` for
//! library-level errors. "Pattern not found" is deliberately not an error:
//! queries report empty results instead of raising.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using TagletError
pub type Result<T> = std::result::Result<T, TagletError>;

/// Core error types for Taglet operations.
///
/// These errors represent specific failure modes that callers may want to
/// handle differently (e.g., prompting for new input on `InvalidInput`, or
/// discarding a stale snapshot on `SnapshotVersionMismatch`).
#[derive(Error, Debug)]
pub enum TagletError {
    // === Input Errors ===
    /// The caller supplied input the index cannot accept (e.g., an empty tag)
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    // === Snapshot Errors ===
    /// The snapshot format version doesn't match the current version
    #[error("snapshot version mismatch: found {found}, expected {expected}")]
    SnapshotVersionMismatch { found: u32, expected: u32 },

    /// The snapshot exists but is corrupted or unreadable
    #[error("snapshot is corrupted: {reason}")]
    SnapshotCorrupted { reason: String },

    /// The snapshot file is missing or could not be found
    #[error("snapshot not found at {path}")]
    SnapshotNotFound { path: PathBuf },

    // === Configuration Errors ===
    /// Configuration file parsing failed
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// Serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TagletError {
    /// Create an invalid-input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        TagletError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create a corruption error
    pub fn corrupted(reason: impl Into<String>) -> Self {
        TagletError::SnapshotCorrupted {
            reason: reason.into(),
        }
    }

    /// Returns true if this error means the stored snapshot is unusable and
    /// the index should be rebuilt from its source strings
    pub fn requires_rebuild(&self) -> bool {
        matches!(
            self,
            TagletError::SnapshotVersionMismatch { .. }
                | TagletError::SnapshotCorrupted { .. }
                | TagletError::SnapshotNotFound { .. }
        )
    }
}

impl From<bincode::Error> for TagletError {
    fn from(err: bincode::Error) -> Self {
        TagletError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_rebuild() {
        let err = TagletError::SnapshotVersionMismatch {
            found: 99,
            expected: 1,
        };
        assert!(err.requires_rebuild());

        let err = TagletError::SnapshotNotFound {
            path: PathBuf::from("/test"),
        };
        assert!(err.requires_rebuild());

        let err = TagletError::invalid_input("empty tag");
        assert!(!err.requires_rebuild());
    }

    #[test]
    fn test_display() {
        let err = TagletError::invalid_input("cannot insert an empty string");
        assert_eq!(
            err.to_string(),
            "invalid input: cannot insert an empty string"
        );
    }
}
