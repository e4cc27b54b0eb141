//! Cache reconciler keeping the cached snapshots in sync with a track source.
//!
//! Two named snapshots are maintained: the full library, polled on a long
//! period, and the result of the latest query, polled on a short period and
//! re-fetched whenever the query changes. Each reconciliation cycle fetches,
//! diffs against the cached snapshot and publishes only non-empty changes.

use std::sync::Arc;

use {
    parking_lot::Mutex as SyncMutex,
    tokio::{
        sync::Mutex as AsyncMutex,
        task::JoinHandle,
        time::{MissedTickBehavior, interval},
    },
    tracing::debug,
};

use crate::{
    error::domain::Result,
    library::{diff::SnapshotDiff, source::TrackSource},
    state::{
        broadcaster::{ChangeBroadcaster, Subscription},
        cache_state::CacheState,
        events::{CacheEvent, SnapshotKind},
    },
};

mod config;
mod handlers;


pub use config::ReconcilerConfig;

/// Where a snapshot is in its reconciliation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    /// No cycle in flight.
    #[default]
    Idle,
    /// Waiting on the track source.
    Fetching,
    /// Diffing and swapping the snapshot.
    Reconciling,
}

/// Result of one reconciliation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The fetched snapshot equals the cached one; nothing was published.
    Unchanged,
    /// The snapshot was replaced; the diff describes the change.
    Updated(SnapshotDiff),
    /// Fetching failed; the cached snapshot is untouched.
    Failed(String),
    /// Another cycle for the same snapshot was in flight.
    Coalesced,
    /// No fetch was needed, or the result went stale before it was applied.
    Skipped,
}

/// How a successful cycle announces its change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PublishMode {
    /// Publish the diff.
    Diff,
    /// Publish the whole new snapshot.
    State,
}

/// How a cycle acquires its snapshot gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    /// Give up if a cycle is in flight.
    Coalesce,
    /// Wait for the in-flight cycle to finish.
    Wait,
}

/// Serializes cycles of one snapshot.
#[derive(Debug, Default)]
struct SnapshotGate {
    lock: AsyncMutex<()>,
    phase: SyncMutex<CyclePhase>,
}

/// State shared by the reconciler and its background tasks.
struct Shared {
    source: Arc<dyn TrackSource>,
    state: Arc<CacheState>,
    broadcaster: Arc<ChangeBroadcaster>,
    all_gate: SnapshotGate,
    query_gate: SnapshotGate,
}

impl Shared {
    fn gate(&self, kind: SnapshotKind) -> &SnapshotGate {
        match kind {
            SnapshotKind::All => &self.all_gate,
            SnapshotKind::Query => &self.query_gate,
        }
    }
}

/// Keeps `CacheState` synchronized with a `TrackSource`.
///
/// Cloning is cheap; clones drive the same cache.
#[derive(Clone)]
pub struct CacheReconciler {
    shared: Arc<Shared>,
    config: ReconcilerConfig,
}

impl CacheReconciler {
    /// Creates a reconciler with an empty cache.
    ///
    /// # Arguments
    ///
    /// * `source` - Where tracks are fetched from.
    /// * `config` - Polling periods.
    ///
    /// # Returns
    ///
    /// A new `CacheReconciler`. Nothing is fetched until a cycle runs.
    #[must_use]
    pub fn new(source: Arc<dyn TrackSource>, config: ReconcilerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                state: Arc::new(CacheState::new()),
                broadcaster: Arc::new(ChangeBroadcaster::new()),
                all_gate: SnapshotGate::default(),
                query_gate: SnapshotGate::default(),
            }),
            config,
        }
    }

    /// The cache this reconciler maintains.
    #[must_use]
    pub fn state(&self) -> Arc<CacheState> {
        Arc::clone(&self.shared.state)
    }

    /// The broadcaster change events are published on.
    #[must_use]
    pub fn broadcaster(&self) -> Arc<ChangeBroadcaster> {
        Arc::clone(&self.shared.broadcaster)
    }

    /// The polling configuration.
    #[must_use]
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Current phase of a snapshot's cycle.
    #[must_use]
    pub fn phase(&self, kind: SnapshotKind) -> CyclePhase {
        *self.shared.gate(kind).phase.lock()
    }

    /// Registers an observer.
    ///
    /// The observer first receives the full state of the active view:
    /// `StateQuery` while a query is set, `StateAll` otherwise. The state is
    /// read under the broadcaster lock, so a change published concurrently
    /// is either part of that state or delivered after it.
    pub fn subscribe(&self) -> Subscription {
        let state = &self.shared.state;
        self.shared.broadcaster.subscribe_with(|| {
            if state.has_query() {
                CacheEvent::StateQuery(state.query_tracks())
            } else {
                CacheEvent::StateAll(state.all_tracks())
            }
        })
    }

    /// Runs one full-library cycle, coalescing with an in-flight one.
    pub async fn reconcile_all(&self) -> CycleOutcome {
        handlers::run_cycle(
            &self.shared,
            SnapshotKind::All,
            PublishMode::Diff,
            Admission::Coalesce,
        )
        .await
    }

    /// Runs one query-result cycle, coalescing with an in-flight one.
    ///
    /// Skipped while no query is set.
    pub async fn reconcile_query(&self) -> CycleOutcome {
        handlers::run_cycle(
            &self.shared,
            SnapshotKind::Query,
            PublishMode::Diff,
            Admission::Coalesce,
        )
        .await
    }

    /// Changes the active query.
    ///
    /// An empty query clears the query snapshot and publishes `StateAll`.
    /// Otherwise the query result is fetched right away and published as
    /// `StateQuery`, even when it equals the cached result, so observers
    /// always switch to the query view. Returns `Unchanged` in that case.
    pub async fn set_query(&self, query: &str) -> CycleOutcome {
        self.shared.state.set_latest_query(query);
        if query.trim().is_empty() {
            handlers::clear_query(&self.shared).await;
            return CycleOutcome::Skipped;
        }

        handlers::run_cycle(
            &self.shared,
            SnapshotKind::Query,
            PublishMode::State,
            Admission::Wait,
        )
        .await
    }

    /// Re-reads specific files and patches them into both snapshots.
    ///
    /// # Arguments
    ///
    /// * `paths` - File paths to refresh; paths not in the library are ignored.
    ///
    /// # Returns
    ///
    /// The number of tracks actually refreshed.
    ///
    /// # Errors
    ///
    /// Returns an error if the track source fails; an `ErrorAll` event is
    /// published as well and the snapshots are left untouched.
    pub async fn refresh(&self, paths: &[String]) -> Result<usize> {
        handlers::refresh_paths(&self.shared, paths).await
    }

    /// Spawns the two polling tasks on the current tokio runtime.
    ///
    /// Each task ticks immediately, then once per configured period.
    ///
    /// # Returns
    ///
    /// A handle that stops both tasks when shut down or dropped.
    #[must_use]
    pub fn start(&self) -> ReconcilerHandle {
        let tasks = [
            (SnapshotKind::All, self.config.all_tracks_interval),
            (SnapshotKind::Query, self.config.query_tracks_interval),
        ]
        .into_iter()
        .map(|(kind, period)| {
            let reconciler = self.clone();
            tokio::spawn(async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let outcome = match kind {
                        SnapshotKind::All => reconciler.reconcile_all().await,
                        SnapshotKind::Query => reconciler.reconcile_query().await,
                    };
                    debug!(snapshot = kind.as_str(), ?outcome, "Polling cycle finished");
                }
            })
        })
        .collect();

        ReconcilerHandle { tasks }
    }
}

/// Owns the polling tasks started by [`CacheReconciler::start`].
#[derive(Debug)]
pub struct ReconcilerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Stops polling.
    pub fn shutdown(self) {
        drop(self);
    }

    /// Whether any polling task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
