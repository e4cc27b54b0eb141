//! Insertion-ordered track collections keyed by file path.

use std::{
    collections::{HashMap, hash_map::Entry},
    slice::Iter,
};

use {
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    tracing::warn,
};

use crate::{error::domain::SnapshotError, library::models::TrackRecord};

/// Immutable-at-a-point-in-time ordered collection of tracks.
///
/// Uniqueness of `file_path` is an invariant of every snapshot. Snapshots
/// are never mutated in place once shared; updates build a new snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySnapshot {
    /// Tracks in insertion order.
    tracks: Vec<TrackRecord>,
    /// Position of each file path within `tracks`.
    index: HashMap<String, usize>,
}

impl LibrarySnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot, rejecting duplicate file paths.
    ///
    /// # Arguments
    ///
    /// * `tracks` - Tracks in library order.
    ///
    /// # Returns
    ///
    /// A `Result` containing the snapshot or a `SnapshotError`.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::DuplicatePath` if two tracks share a path.
    pub fn try_from_tracks(tracks: Vec<TrackRecord>) -> Result<Self, SnapshotError> {
        let mut index = HashMap::with_capacity(tracks.len());
        for (position, track) in tracks.iter().enumerate() {
            match index.entry(track.file_path.clone()) {
                Entry::Occupied(_) => {
                    return Err(SnapshotError::DuplicatePath {
                        file_path: track.file_path.clone(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(position);
                }
            }
        }
        Ok(Self { tracks, index })
    }

    /// Builds a snapshot from external data, keeping the first occurrence
    /// of any duplicated path.
    ///
    /// Duplicates are a bug in the producer; each one is logged and dropped.
    #[must_use]
    pub fn from_tracks_lossy(tracks: Vec<TrackRecord>) -> Self {
        let mut snapshot = Self {
            tracks: Vec::with_capacity(tracks.len()),
            index: HashMap::with_capacity(tracks.len()),
        };
        for track in tracks {
            if snapshot.index.contains_key(&track.file_path) {
                warn!(file_path = %track.file_path, "Dropping duplicate track path");
                continue;
            }
            snapshot
                .index
                .insert(track.file_path.clone(), snapshot.tracks.len());
            snapshot.tracks.push(track);
        }
        snapshot
    }

    /// Number of tracks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the snapshot holds no tracks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Looks up a track by file path.
    #[must_use]
    pub fn get(&self, file_path: &str) -> Option<&TrackRecord> {
        self.index.get(file_path).map(|&position| &self.tracks[position])
    }

    /// Position of a track within the snapshot order.
    #[must_use]
    pub fn position(&self, file_path: &str) -> Option<usize> {
        self.index.get(file_path).copied()
    }

    /// Whether a track with this path exists.
    #[must_use]
    pub fn contains(&self, file_path: &str) -> bool {
        self.index.contains_key(file_path)
    }

    /// Iterates tracks in snapshot order.
    pub fn iter(&self) -> Iter<'_, TrackRecord> {
        self.tracks.iter()
    }

    /// Tracks in snapshot order.
    #[must_use]
    pub fn tracks(&self) -> &[TrackRecord] {
        &self.tracks
    }

    /// File paths in snapshot order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|track| track.file_path.as_str())
    }

    /// Consumes the snapshot, returning its tracks in order.
    #[must_use]
    pub fn into_tracks(self) -> Vec<TrackRecord> {
        self.tracks
    }

    /// Returns a new snapshot with the given records replaced by path.
    ///
    /// Records whose path is not present are ignored; order is preserved.
    ///
    /// # Arguments
    ///
    /// * `records` - Fresh versions of existing tracks.
    ///
    /// # Returns
    ///
    /// The patched snapshot.
    #[must_use]
    pub fn with_replaced(&self, records: &[TrackRecord]) -> Self {
        let mut patched = self.clone();
        for record in records {
            if let Some(&position) = patched.index.get(&record.file_path) {
                patched.tracks[position] = record.clone();
            }
        }
        patched
    }
}

impl<'a> IntoIterator for &'a LibrarySnapshot {
    type Item = &'a TrackRecord;
    type IntoIter = Iter<'a, TrackRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

impl Serialize for LibrarySnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tracks.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LibrarySnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tracks = Vec::<TrackRecord>::deserialize(deserializer)?;
        Self::try_from_tracks(tracks).map_err(serde::de::Error::custom)
    }
}
