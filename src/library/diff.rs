//! Structural diffing of library snapshots.
//!
//! A diff is keyed by file path and covers every field of every track as
//! well as the snapshot order, so that applying the diff of `old -> new`
//! to `old` reproduces `new` exactly.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::library::{
    models::{TrackField, TrackRecord},
    snapshot::LibrarySnapshot,
};

/// A single keyed change between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TrackChange {
    /// A track present only in the new snapshot.
    #[serde(rename_all = "camelCase")]
    Added {
        /// Position of the track in the new snapshot.
        index: usize,
        /// The new track.
        track: TrackRecord,
    },
    /// A track present only in the old snapshot.
    #[serde(rename_all = "camelCase")]
    Removed {
        /// Path of the removed track.
        file_path: String,
    },
    /// A track present in both snapshots with differing fields.
    #[serde(rename_all = "camelCase")]
    Modified {
        /// Path of the modified track.
        file_path: String,
        /// Fields whose values changed.
        fields: Vec<TrackField>,
        /// The new version of the track.
        track: TrackRecord,
    },
    /// The final ordering, emitted only when patching would otherwise
    /// leave tracks in a different order than the new snapshot.
    Reordered {
        /// File paths in new snapshot order.
        order: Vec<String>,
    },
}

/// Minimal set of keyed changes between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotDiff {
    changes: Vec<TrackChange>,
}

impl SnapshotDiff {
    /// Computes the structural diff between two snapshots.
    ///
    /// # Arguments
    ///
    /// * `old` - The snapshot currently held.
    /// * `new` - The freshly fetched snapshot.
    ///
    /// # Returns
    ///
    /// A diff that is empty iff both snapshots are structurally identical.
    #[must_use]
    pub fn between(old: &LibrarySnapshot, new: &LibrarySnapshot) -> Self {
        let mut changes = Vec::new();

        for track in old.iter() {
            if !new.contains(&track.file_path) {
                changes.push(TrackChange::Removed {
                    file_path: track.file_path.clone(),
                });
            }
        }

        for track in new.iter() {
            if let Some(previous) = old.get(&track.file_path) {
                let fields = previous.changed_fields(track);
                if !fields.is_empty() {
                    changes.push(TrackChange::Modified {
                        file_path: track.file_path.clone(),
                        fields,
                        track: track.clone(),
                    });
                }
            }
        }

        for (index, track) in new.iter().enumerate() {
            if !old.contains(&track.file_path) {
                changes.push(TrackChange::Added {
                    index,
                    track: track.clone(),
                });
            }
        }

        let mut diff = Self { changes };
        let patched = diff.apply(old);
        if !patched.paths().eq(new.paths()) {
            diff.changes.push(TrackChange::Reordered {
                order: new.paths().map(str::to_string).collect(),
            });
        }
        diff
    }

    /// Whether the diff carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// The changes in application order.
    #[must_use]
    pub fn changes(&self) -> &[TrackChange] {
        &self.changes
    }

    /// Applies the diff to a snapshot, producing a new snapshot.
    ///
    /// Changes are applied by kind: removals and modifications in one pass
    /// over the snapshot, then insertions by ascending index, then the
    /// optional reorder. The cost is linear in the snapshot and diff size.
    #[must_use]
    pub fn apply(&self, snapshot: &LibrarySnapshot) -> LibrarySnapshot {
        let mut removed = HashSet::new();
        let mut modified = HashMap::new();
        let mut added = Vec::new();
        let mut order = None;

        for change in &self.changes {
            match change {
                TrackChange::Removed { file_path } => {
                    removed.insert(file_path.as_str());
                }
                TrackChange::Modified {
                    file_path, track, ..
                } => {
                    modified.insert(file_path.as_str(), track);
                }
                TrackChange::Added { index, track } => added.push((*index, track)),
                TrackChange::Reordered { order: paths } => order = Some(paths),
            }
        }
        added.sort_by_key(|(index, _)| *index);

        let kept = snapshot
            .iter()
            .filter(|track| !removed.contains(track.file_path.as_str()))
            .map(|track| {
                modified
                    .get(track.file_path.as_str())
                    .map_or_else(|| track.clone(), |&replacement| replacement.clone())
            });

        let mut tracks = Vec::with_capacity(snapshot.len() + added.len());
        let mut pending = added.into_iter().peekable();
        for track in kept {
            while let Some((_, insert)) = pending.next_if(|(index, _)| *index <= tracks.len()) {
                tracks.push(insert.clone());
            }
            tracks.push(track);
        }
        tracks.extend(pending.map(|(_, insert)| insert.clone()));

        if let Some(paths) = order {
            let rank: HashMap<&str, usize> = paths
                .iter()
                .enumerate()
                .map(|(position, path)| (path.as_str(), position))
                .collect();
            tracks.sort_by_key(|track| {
                rank.get(track.file_path.as_str())
                    .copied()
                    .unwrap_or(usize::MAX)
            });
        }

        LibrarySnapshot::from_tracks_lossy(tracks)
    }
}
