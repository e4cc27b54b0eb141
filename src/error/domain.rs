//! Domain-specific error types using `thiserror`.
//!
//! This module defines the error enums for the different domains of the
//! crate: metadata extraction, track sources, snapshots and synchronization.
//! Query parsing has no error type; malformed queries degrade to plain text.

use std::{path::PathBuf, result::Result as StdResult};

use {anyhow::Error, thiserror::Error};

/// Errors surfaced by a metadata reader for a single file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// The file is not a supported audio format.
    #[error("The file {0:?} is not supported or is not a music file")]
    Unsupported(PathBuf),
    /// The file is supported but could not be read.
    #[error("Failed to read metadata from {path:?}: {reason}")]
    Failed { path: PathBuf, reason: String },
}

/// Errors surfaced by a track source while fetching.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source could not be reached.
    #[error("Track source unavailable: {reason}")]
    Unavailable { reason: String },
    /// The source answered with data that could not be used.
    #[error("Invalid response from track source: {reason}")]
    InvalidResponse { reason: String },
    /// Metadata extraction failed while refreshing.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Errors raised when building a snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Two tracks share the same file path.
    #[error("Duplicate track path: {file_path}")]
    DuplicatePath { file_path: String },
}

/// Synchronization errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Fetching from the source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// The fetched tracks did not form a valid snapshot.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Operational error context propagation with `anyhow`.
///
/// This type is used for operational errors that need rich context
/// but don't require specific handling logic.
pub type Result<T> = StdResult<T, Error>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::error::domain::{MetadataError, SnapshotError, SourceError, SyncError};

    #[test]
    fn test_metadata_error_display() {
        let unsupported = MetadataError::Unsupported(PathBuf::from("/music/cover.jpg"));
        assert_eq!(
            unsupported.to_string(),
            r#"The file "/music/cover.jpg" is not supported or is not a music file"#
        );

        let failed = MetadataError::Failed {
            path: PathBuf::from("/music/a.flac"),
            reason: "truncated header".to_string(),
        };
        assert!(failed.to_string().contains("truncated header"));
    }

    #[test]
    fn test_source_error_display() {
        let unavailable = SourceError::Unavailable {
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            unavailable.to_string(),
            "Track source unavailable: connection refused"
        );

        let wrapped = SyncError::from(unavailable);
        assert_eq!(
            wrapped.to_string(),
            "Track source unavailable: connection refused"
        );
    }

    #[test]
    fn test_snapshot_error_display() {
        let duplicate = SyncError::from(SnapshotError::DuplicatePath {
            file_path: "/a.flac".to_string(),
        });
        assert_eq!(duplicate.to_string(), "Duplicate track path: /a.flac");
    }
}
