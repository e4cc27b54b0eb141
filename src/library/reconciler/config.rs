//! Configuration for the cache reconciler.

use std::time::Duration;

use crate::config::settings::SyncSettings;

/// Polling periods of the two cached snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// How often the full library is re-fetched.
    pub all_tracks_interval: Duration,
    /// How often the query result is re-fetched.
    pub query_tracks_interval: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            all_tracks_interval: Duration::from_secs(30),
            query_tracks_interval: Duration::from_secs(5),
        }
    }
}

impl From<&SyncSettings> for ReconcilerConfig {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            all_tracks_interval: Duration::from_millis(settings.all_tracks_interval_ms),
            query_tracks_interval: Duration::from_millis(settings.query_tracks_interval_ms),
        }
    }
}
