//! Query execution over a library snapshot.

use tracing::debug;

use crate::{
    library::{models::TrackRecord, snapshot::LibrarySnapshot},
    query::{
        ast::QueryExpression,
        evaluator::{MatchContext, evaluate_in},
        parser::parse,
    },
};

/// Runs a bang query over a library.
///
/// # Arguments
///
/// * `library` - Tracks to search, in library order
/// * `input` - Raw query text
///
/// # Returns
///
/// The matching tracks in library order. Empty or whitespace-only input
/// returns the whole library without parsing.
#[must_use]
pub fn query(library: &LibrarySnapshot, input: &str) -> Vec<TrackRecord> {
    if input.trim().is_empty() {
        return library.tracks().to_vec();
    }
    filter(library, &parse(input))
}

/// Runs a bang query and keeps the result as a snapshot.
#[must_use]
pub fn query_snapshot(library: &LibrarySnapshot, input: &str) -> LibrarySnapshot {
    // Paths are unique in the library, so any subset is too.
    LibrarySnapshot::from_tracks_lossy(query(library, input))
}

/// Filters a library with an already parsed expression.
///
/// The duplicate index is only built when the expression contains `!dup`.
#[must_use]
pub fn filter(library: &LibrarySnapshot, expression: &QueryExpression) -> Vec<TrackRecord> {
    if expression.is_all() {
        return library.tracks().to_vec();
    }

    let context = if expression.contains_duplicates_bang() {
        MatchContext::from_library(library)
    } else {
        MatchContext::default()
    };

    let matches: Vec<TrackRecord> = library
        .iter()
        .filter(|record| evaluate_in(expression, record, &context))
        .cloned()
        .collect();

    debug!(
        query = %expression,
        library = library.len(),
        matched = matches.len(),
        "Query evaluated"
    );
    matches
}

#[cfg(test)]
mod tests {
    use crate::{
        library::{models::TrackRecord, snapshot::LibrarySnapshot},
        query::engine::{query, query_snapshot},
    };

    fn library() -> LibrarySnapshot {
        let tracks = ["Alpha", "Beta", "Gamma"]
            .iter()
            .map(|title| TrackRecord {
                title: (*title).to_string(),
                ..TrackRecord::new(format!("/{title}.flac"))
            })
            .collect();
        LibrarySnapshot::try_from_tracks(tracks).unwrap()
    }

    #[test]
    fn test_empty_query_returns_library() {
        let library = library();
        assert_eq!(query(&library, "  "), library.tracks().to_vec());
    }

    #[test]
    fn test_query_preserves_library_order() {
        let titles: Vec<String> = query(&library(), "!t{a} | !t{m}")
            .into_iter()
            .map(|track| track.title)
            .collect();
        assert_eq!(titles, ["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn test_query_empty_library() {
        assert!(query(&LibrarySnapshot::new(), "!t{x}").is_empty());
    }

    #[test]
    fn test_query_snapshot_keys() {
        let result = query_snapshot(&library(), "!T{Beta}");
        assert_eq!(result.len(), 1);
        assert!(result.contains("/Beta.flac"));
    }
}
