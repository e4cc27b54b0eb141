//! Change notifications published to cache observers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::library::{diff::SnapshotDiff, snapshot::LibrarySnapshot};

/// Which cached view an event or cycle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotKind {
    /// The full library.
    All,
    /// The result of the latest query.
    Query,
}

impl SnapshotKind {
    /// Lower-case name used in logs and event kinds.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Query => "query",
        }
    }
}

/// Cache change events.
///
/// Serialized as `{ "type": "diff-all", "payload": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum CacheEvent {
    /// Incremental change to the full library.
    DiffAll(SnapshotDiff),
    /// Incremental change to the query result.
    DiffQuery(SnapshotDiff),
    /// Complete replacement of the full library.
    StateAll(Arc<LibrarySnapshot>),
    /// Complete replacement of the query result.
    StateQuery(Arc<LibrarySnapshot>),
    /// Fetching the full library failed.
    ErrorAll(String),
    /// Fetching the query result failed.
    ErrorQuery(String),
}

impl CacheEvent {
    /// Builds a diff event for a snapshot.
    #[must_use]
    pub fn diff(kind: SnapshotKind, diff: SnapshotDiff) -> Self {
        match kind {
            SnapshotKind::All => Self::DiffAll(diff),
            SnapshotKind::Query => Self::DiffQuery(diff),
        }
    }

    /// Builds a full-state event for a snapshot.
    #[must_use]
    pub fn state(kind: SnapshotKind, snapshot: Arc<LibrarySnapshot>) -> Self {
        match kind {
            SnapshotKind::All => Self::StateAll(snapshot),
            SnapshotKind::Query => Self::StateQuery(snapshot),
        }
    }

    /// Builds an error event for a snapshot.
    #[must_use]
    pub fn error(kind: SnapshotKind, message: String) -> Self {
        match kind {
            SnapshotKind::All => Self::ErrorAll(message),
            SnapshotKind::Query => Self::ErrorQuery(message),
        }
    }

    /// Wire name of the event kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DiffAll(_) => "diff-all",
            Self::DiffQuery(_) => "diff-query",
            Self::StateAll(_) => "state-all",
            Self::StateQuery(_) => "state-query",
            Self::ErrorAll(_) => "error-all",
            Self::ErrorQuery(_) => "error-query",
        }
    }

    /// The snapshot this event refers to.
    #[must_use]
    pub fn snapshot_kind(&self) -> SnapshotKind {
        match self {
            Self::DiffAll(_) | Self::StateAll(_) | Self::ErrorAll(_) => SnapshotKind::All,
            Self::DiffQuery(_) | Self::StateQuery(_) | Self::ErrorQuery(_) => SnapshotKind::Query,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json, to_value};

    use crate::{
        library::{models::TrackRecord, snapshot::LibrarySnapshot},
        state::events::{CacheEvent, SnapshotKind},
    };

    #[test]
    fn test_event_kind_matches_serialized_type() {
        let snapshot = Arc::new(
            LibrarySnapshot::try_from_tracks(vec![TrackRecord::new("/a.flac")]).unwrap(),
        );
        let events = [
            CacheEvent::diff(SnapshotKind::All, Default::default()),
            CacheEvent::diff(SnapshotKind::Query, Default::default()),
            CacheEvent::state(SnapshotKind::All, Arc::clone(&snapshot)),
            CacheEvent::state(SnapshotKind::Query, snapshot),
            CacheEvent::error(SnapshotKind::All, "boom".to_string()),
            CacheEvent::error(SnapshotKind::Query, "boom".to_string()),
        ];

        for event in events {
            let value = to_value(&event).unwrap();
            assert_eq!(value["type"], Value::from(event.kind()));
        }
    }

    #[test]
    fn test_error_event_payload() {
        let event = CacheEvent::error(SnapshotKind::Query, "timeout".to_string());
        assert_eq!(event.snapshot_kind(), SnapshotKind::Query);
        assert_eq!(
            to_value(&event).unwrap(),
            json!({ "type": "error-query", "payload": "timeout" })
        );
    }
}
