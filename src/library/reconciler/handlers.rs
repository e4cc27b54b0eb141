//! Reconciliation cycle handlers.

use std::collections::HashSet;

use {
    anyhow::Error,
    tracing::{debug, info},
};

use crate::{
    error::{
        domain::{Result, SyncError},
        operational::{ErrorReporter, ResultExt},
    },
    library::{
        diff::SnapshotDiff,
        reconciler::{Admission, CycleOutcome, CyclePhase, PublishMode, Shared, SnapshotGate},
        snapshot::LibrarySnapshot,
    },
    state::events::{CacheEvent, SnapshotKind},
};

/// Resets a gate's phase to idle when the cycle ends, however it ends.
struct PhaseGuard<'a> {
    gate: &'a SnapshotGate,
}

impl<'a> PhaseGuard<'a> {
    fn enter(gate: &'a SnapshotGate, phase: CyclePhase) -> Self {
        *gate.phase.lock() = phase;
        Self { gate }
    }

    fn advance(&self, phase: CyclePhase) {
        *self.gate.phase.lock() = phase;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *self.gate.phase.lock() = CyclePhase::Idle;
    }
}

/// Logs a failure and publishes it as an error event.
///
/// # Returns
///
/// The user-facing message carried by the event.
fn report_failure(shared: &Shared, kind: SnapshotKind, error: &Error) -> String {
    ErrorReporter::warn(error, kind.as_str());
    let message = ErrorReporter::to_user_message(error);
    shared
        .broadcaster
        .publish(&CacheEvent::error(kind, message.clone()));
    message
}

/// Fetches a snapshot's tracks from the source.
async fn fetch_snapshot(shared: &Shared, kind: SnapshotKind, query: &str) -> Result<LibrarySnapshot> {
    let tracks = shared
        .source
        .fetch(query)
        .await
        .map_err(SyncError::from)
        .add_contextf(format!("Failed to fetch {} tracks", kind.as_str()))?;

    LibrarySnapshot::try_from_tracks(tracks)
        .map_err(SyncError::from)
        .add_contextf(format!("Rejected {} tracks", kind.as_str()))
}

/// Runs one fetch, diff and publish pass over a snapshot.
///
/// # Arguments
///
/// * `shared` - Reconciler state.
/// * `kind` - Which snapshot to reconcile.
/// * `mode` - Whether a change is published as a diff or as full state.
/// * `admission` - Whether to wait for or coalesce with an in-flight cycle.
///
/// # Returns
///
/// What the cycle did.
pub(super) async fn run_cycle(
    shared: &Shared,
    kind: SnapshotKind,
    mode: PublishMode,
    admission: Admission,
) -> CycleOutcome {
    let gate = shared.gate(kind);
    let _permit = match admission {
        Admission::Wait => gate.lock.lock().await,
        Admission::Coalesce => match gate.lock.try_lock() {
            Ok(permit) => permit,
            Err(_) => {
                debug!(snapshot = kind.as_str(), "Cycle already in flight, coalescing");
                return CycleOutcome::Coalesced;
            }
        },
    };

    let query = match kind {
        SnapshotKind::All => String::new(),
        SnapshotKind::Query => {
            let query = shared.state.latest_query();
            if query.trim().is_empty() {
                return CycleOutcome::Skipped;
            }
            query
        }
    };

    let phase = PhaseGuard::enter(gate, CyclePhase::Fetching);
    debug!(snapshot = kind.as_str(), query = %query, "Fetching tracks");

    let fetched = match fetch_snapshot(shared, kind, &query).await {
        Ok(fetched) => fetched,
        Err(error) => return CycleOutcome::Failed(report_failure(shared, kind, &error)),
    };

    phase.advance(CyclePhase::Reconciling);
    if kind == SnapshotKind::Query && shared.state.latest_query() != query {
        debug!(query = %query, "Query changed while fetching, dropping result");
        return CycleOutcome::Skipped;
    }

    let current = shared.state.snapshot(kind);
    let diff = SnapshotDiff::between(&current, &fetched);
    if diff.is_empty() {
        debug!(snapshot = kind.as_str(), "No changes");
        // A new query still switches the active view, even to an identical result.
        if mode == PublishMode::State {
            shared.broadcaster.publish(&CacheEvent::state(kind, current));
        }
        return CycleOutcome::Unchanged;
    }

    let replaced = shared.state.replace(kind, fetched);
    info!(
        snapshot = kind.as_str(),
        tracks = replaced.len(),
        changes = diff.len(),
        "Snapshot replaced"
    );

    let event = match mode {
        PublishMode::Diff => CacheEvent::diff(kind, diff.clone()),
        PublishMode::State => CacheEvent::state(kind, replaced),
    };
    shared.broadcaster.publish(&event);
    CycleOutcome::Updated(diff)
}

/// Empties the query snapshot and announces the full library as the
/// active view.
pub(super) async fn clear_query(shared: &Shared) {
    let _permit = shared.query_gate.lock.lock().await;
    shared.state.replace(SnapshotKind::Query, LibrarySnapshot::new());
    debug!("Query cleared");

    shared
        .broadcaster
        .publish(&CacheEvent::StateAll(shared.state.all_tracks()));
}

/// Re-reads known paths and patches both snapshots.
///
/// # Returns
///
/// The number of tracks refreshed.
///
/// # Errors
///
/// Returns the source failure after publishing it as `ErrorAll`.
pub(super) async fn refresh_paths(shared: &Shared, paths: &[String]) -> Result<usize> {
    let library = shared.state.all_tracks();
    let (known, unknown): (Vec<String>, Vec<String>) =
        paths.iter().cloned().partition(|path| library.contains(path));
    if !unknown.is_empty() {
        debug!(?unknown, "Ignoring refresh of paths outside the library");
    }
    if known.is_empty() {
        return Ok(0);
    }

    let _all_permit = shared.all_gate.lock.lock().await;
    let _query_permit = shared.query_gate.lock.lock().await;

    let fetched = shared
        .source
        .refresh(&known)
        .await
        .map_err(SyncError::from)
        .add_context("Failed to refresh tracks");
    let fetched = match fetched {
        Ok(fetched) => fetched,
        Err(error) => {
            report_failure(shared, SnapshotKind::All, &error);
            return Err(error);
        }
    };

    let wanted: HashSet<&str> = known.iter().map(String::as_str).collect();
    let fresh: Vec<_> = fetched
        .into_iter()
        .filter(|track| wanted.contains(track.file_path.as_str()))
        .collect();

    for kind in [SnapshotKind::All, SnapshotKind::Query] {
        let current = shared.state.snapshot(kind);
        let patched = current.with_replaced(&fresh);
        let diff = SnapshotDiff::between(&current, &patched);
        if diff.is_empty() {
            continue;
        }
        shared.state.replace(kind, patched);
        info!(snapshot = kind.as_str(), changes = diff.len(), "Snapshot patched");
        shared.broadcaster.publish(&CacheEvent::diff(kind, diff));
    }

    Ok(fresh.len())
}
