//! Cached library views and change notification.
//!
//! `CacheState` holds the two snapshots, `ChangeBroadcaster` tells
//! observers how they changed.

pub mod broadcaster;
pub mod cache_state;
pub mod events;

pub use {
    broadcaster::{CacheObserver, ChangeBroadcaster, Subscription},
    cache_state::CacheState,
    events::{CacheEvent, SnapshotKind},
};
