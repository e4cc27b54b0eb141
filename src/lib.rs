//! Tracksync - bang-query track cache
//!
//! A music library cache that keeps the full library and the result of the
//! current query synchronized with a track source. Queries are written in a
//! small bang language (`!t{Hotel} & !f{flac24}`) that is parsed into a
//! predicate tree and evaluated per track. Changes are detected by
//! structural diffing and pushed to observers as typed events.

pub mod config;
pub mod error;
pub mod library;
pub mod query;
pub mod state;

pub use {
    config::{SettingsError, SettingsManager, SyncSettings},
    error::{ErrorReporter, MetadataError, ResultExt, SnapshotError, SourceError, SyncError},
    library::{
        CacheReconciler, CycleOutcome, CyclePhase, InMemorySource, LibrarySnapshot,
        MetadataReader, ReconcilerConfig, ReconcilerHandle, SnapshotDiff, TrackChange,
        TrackFileType, TrackRecord, TrackSource,
    },
    query::{QueryExpression, parse, query},
    state::{CacheEvent, CacheObserver, CacheState, ChangeBroadcaster, SnapshotKind, Subscription},
};
