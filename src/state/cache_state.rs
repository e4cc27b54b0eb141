//! The two cached library views kept in sync with a track source.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::{library::snapshot::LibrarySnapshot, state::events::SnapshotKind};

/// Shared cache of the full library and the latest query result.
///
/// Snapshots are swapped whole, so a reader holding an `Arc` from
/// [`CacheState::snapshot`] always sees one consistent version.
#[derive(Debug, Default)]
pub struct CacheState {
    all_tracks: RwLock<Arc<LibrarySnapshot>>,
    query_tracks: RwLock<Arc<LibrarySnapshot>>,
    latest_query: RwLock<String>,
}

impl CacheState {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: SnapshotKind) -> &RwLock<Arc<LibrarySnapshot>> {
        match kind {
            SnapshotKind::All => &self.all_tracks,
            SnapshotKind::Query => &self.query_tracks,
        }
    }

    /// Current version of a snapshot.
    #[must_use]
    pub fn snapshot(&self, kind: SnapshotKind) -> Arc<LibrarySnapshot> {
        self.slot(kind).read().clone()
    }

    /// The full library.
    #[must_use]
    pub fn all_tracks(&self) -> Arc<LibrarySnapshot> {
        self.snapshot(SnapshotKind::All)
    }

    /// The latest query result.
    #[must_use]
    pub fn query_tracks(&self) -> Arc<LibrarySnapshot> {
        self.snapshot(SnapshotKind::Query)
    }

    /// The query the query snapshot was built from.
    #[must_use]
    pub fn latest_query(&self) -> String {
        self.latest_query.read().clone()
    }

    /// Whether a non-empty query is active.
    #[must_use]
    pub fn has_query(&self) -> bool {
        !self.latest_query.read().trim().is_empty()
    }

    pub(crate) fn set_latest_query(&self, query: &str) {
        *self.latest_query.write() = query.to_string();
    }

    /// Swaps in a new snapshot and returns it.
    pub(crate) fn replace(
        &self,
        kind: SnapshotKind,
        snapshot: LibrarySnapshot,
    ) -> Arc<LibrarySnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.slot(kind).write() = Arc::clone(&snapshot);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use crate::{
        library::{models::TrackRecord, snapshot::LibrarySnapshot},
        state::{cache_state::CacheState, events::SnapshotKind},
    };

    fn snapshot(prefix: &str, count: usize) -> LibrarySnapshot {
        let tracks = (0..count)
            .map(|i| TrackRecord {
                title: prefix.to_string(),
                ..TrackRecord::new(format!("/{i}.flac"))
            })
            .collect();
        LibrarySnapshot::try_from_tracks(tracks).unwrap()
    }

    #[test]
    fn test_new_cache_is_empty() {
        let state = CacheState::new();
        assert!(state.all_tracks().is_empty());
        assert!(state.query_tracks().is_empty());
        assert!(!state.has_query());
    }

    #[test]
    fn test_replace_keeps_old_readers_consistent() {
        let state = CacheState::new();
        state.replace(SnapshotKind::All, snapshot("old", 3));
        let held = state.all_tracks();

        state.replace(SnapshotKind::All, snapshot("new", 5));
        assert_eq!(held.len(), 3);
        assert!(held.iter().all(|track| track.title == "old"));
        assert_eq!(state.all_tracks().len(), 5);
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let state = Arc::new(CacheState::new());
        state.replace(SnapshotKind::Query, snapshot("old", 50));

        let reader = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    let seen = state.query_tracks();
                    let first = seen.tracks()[0].title.clone();
                    assert!(seen.iter().all(|track| track.title == first));
                }
            })
        };
        for round in 0..200 {
            let prefix = if round % 2 == 0 { "new" } else { "old" };
            state.replace(SnapshotKind::Query, snapshot(prefix, 50));
        }
        reader.join().unwrap();
    }

    #[test]
    fn test_latest_query() {
        let state = CacheState::new();
        state.set_latest_query("!t{x}");
        assert_eq!(state.latest_query(), "!t{x}");
        assert!(state.has_query());
    }
}
