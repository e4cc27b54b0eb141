//! Track library: records, snapshots, diffs and the cache reconciler.
//!
//! This module provides the data model of the cached library together with
//! the sources it is fetched from and the reconciler keeping it current.

pub mod diff;
pub mod models;
pub mod reconciler;
pub mod snapshot;
pub mod source;

pub use {
    diff::{SnapshotDiff, TrackChange},
    models::{BitDepth, FormatFamily, Mp3Mode, TrackField, TrackFileType, TrackRecord},
    reconciler::{CacheReconciler, CycleOutcome, CyclePhase, ReconcilerConfig, ReconcilerHandle},
    snapshot::LibrarySnapshot,
    source::{InMemorySource, MetadataReader, TrackSource},
};
