//! Tracksync - bang-query track cache
//!
//! Loads a library from a JSON file, runs one reconciliation of the full
//! library and of a query, then prints the matching tracks and the cache
//! events that were published.
//!
//! Usage: `tracksync [LIBRARY_JSON] [QUERY...]`

use std::{env::args, fs::read_to_string, process::ExitCode, sync::Arc};

use {
    anyhow::{Result, anyhow},
    serde_json::from_str,
    tracing::{error, info},
    tracing_subscriber::EnvFilter,
};

use tracksync::{
    CacheReconciler, CycleOutcome, ErrorReporter, InMemorySource, LibrarySnapshot,
    ReconcilerConfig, ResultExt, SettingsManager, TrackRecord, TrackSource,
};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            ErrorReporter::error(&error, "tracksync");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let settings = SettingsManager::new()
        .add_context("Failed to load settings")?
        .get_settings()
        .clone();

    let mut arguments = args().skip(1);
    let library_path = arguments
        .next()
        .or_else(|| settings.library_file.clone())
        .ok_or_else(|| anyhow!("No library file given and none configured"))?;
    let query = {
        let rest: Vec<String> = arguments.collect();
        if rest.is_empty() {
            settings.default_query.clone()
        } else {
            rest.join(" ")
        }
    };

    let contents = read_to_string(&library_path)
        .add_contextf(format!("Failed to read library file {library_path}"))?;
    let tracks: Vec<TrackRecord> =
        from_str(&contents).add_contextf(format!("Invalid library file {library_path}"))?;
    let library = LibrarySnapshot::from_tracks_lossy(tracks);
    info!(path = %library_path, tracks = library.len(), "Library loaded");

    let source: Arc<dyn TrackSource> = Arc::new(InMemorySource::new(library));
    let reconciler = CacheReconciler::new(source, ReconcilerConfig::from(&settings));
    let subscription = reconciler.subscribe();

    for outcome in [
        reconciler.reconcile_all().await,
        reconciler.set_query(&query).await,
    ] {
        if let CycleOutcome::Failed(message) = outcome {
            error!(%message, "Reconciliation failed");
        }
    }

    let state = reconciler.state();
    let view = if state.has_query() {
        state.query_tracks()
    } else {
        state.all_tracks()
    };
    for track in view.iter() {
        println!("{} - {} [{}]", track.artist, track.title, track.file_type);
    }

    let kinds: Vec<&str> = subscription.drain().iter().map(|event| event.kind()).collect();
    println!("events: {}", kinds.join(", "));
    Ok(())
}
