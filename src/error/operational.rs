//! Context propagation and failure reporting with `anyhow`.
//!
//! Source and snapshot failures are wrapped with the cycle they broke
//! ("Failed to fetch all tracks") and reported once, both to the log and
//! to observers as the message of an error event.

use std::{error::Error as StdError, fmt::Display, result::Result as StdResult};

use {
    anyhow::{Context, Error},
    tracing::{error, warn},
};

use crate::error::domain::Result;

/// Wraps domain errors into `anyhow` errors with a context line.
pub trait ResultExt<T> {
    /// Adds a fixed context line.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped under `context`.
    fn add_context(self, context: &'static str) -> Result<T>;

    /// Adds a context line built at the call site, e.g. with `format!`.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped under `context`.
    fn add_contextf<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T> for StdResult<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn add_context(self, context: &'static str) -> Result<T> {
        self.context(context)
    }

    fn add_contextf<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.context(context)
    }
}

/// Logs failures and renders them for error events.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Logs a failure the cache recovers from, such as a failed fetch.
    pub fn warn(error: &Error, context: &str) {
        warn!(context, error = %Self::to_user_message(error), "Recoverable failure");
    }

    /// Logs a failure that ends the program.
    pub fn error(error: &Error, context: &str) {
        error!(context, error = %Self::to_user_message(error), "Fatal failure");
    }

    /// Renders the whole cause chain, outermost context first, joined by
    /// `": "`: `"Failed to fetch all tracks: Track source unavailable: ..."`.
    #[must_use]
    pub fn to_user_message(error: &Error) -> String {
        format!("{error:#}")
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Error as IoError, path::PathBuf};

    use anyhow::anyhow;

    use crate::error::{
        domain::{MetadataError, SnapshotError, SourceError, SyncError},
        operational::{ErrorReporter, ResultExt},
    };

    #[test]
    fn test_add_context_keeps_source_as_cause() {
        let result: Result<(), SourceError> = Err(SourceError::InvalidResponse {
            reason: "truncated body".to_string(),
        });

        let error = result.add_context("Failed to fetch query tracks").unwrap_err();
        assert_eq!(error.to_string(), "Failed to fetch query tracks");
        assert!(matches!(
            error.downcast_ref::<SourceError>(),
            Some(SourceError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_add_contextf_with_formatted_line() {
        let result: Result<(), SyncError> = Err(SyncError::from(SnapshotError::DuplicatePath {
            file_path: "/a.flac".to_string(),
        }));

        let error = result
            .add_contextf(format!("Rejected {} tracks", "all"))
            .unwrap_err();
        assert_eq!(
            ErrorReporter::to_user_message(&error),
            "Rejected all tracks: Duplicate track path: /a.flac"
        );
    }

    #[test]
    fn test_user_message_without_context() {
        assert_eq!(ErrorReporter::to_user_message(&anyhow!("offline")), "offline");
    }

    #[test]
    fn test_user_message_walks_nested_causes() {
        let metadata = MetadataError::Unsupported(PathBuf::from("/cover.jpg"));
        let result: Result<(), SyncError> = Err(SyncError::from(SourceError::from(metadata)));

        let error = result.add_context("Failed to refresh tracks").unwrap_err();
        assert_eq!(
            ErrorReporter::to_user_message(&error),
            r#"Failed to refresh tracks: The file "/cover.jpg" is not supported or is not a music file"#
        );
    }

    #[test]
    fn test_io_errors_take_context() {
        let result: Result<String, IoError> = Err(IoError::other("disk gone"));
        let error = result.add_context("Failed to read library file").unwrap_err();
        assert_eq!(
            ErrorReporter::to_user_message(&error),
            "Failed to read library file: disk gone"
        );
    }
}
