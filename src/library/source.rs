//! Track sources the cache reconciler fetches from.
//!
//! A `TrackSource` answers a query with the matching tracks and can re-read
//! individual files on demand. `InMemorySource` serves a snapshot held in
//! memory through the query engine.

use std::{
    collections::HashSet,
    path::Path,
    sync::Arc,
};

use {async_trait::async_trait, parking_lot::RwLock, tracing::warn};

use crate::{
    error::domain::{MetadataError, SourceError},
    library::{models::TrackRecord, snapshot::LibrarySnapshot},
    query,
};

/// Reads a track record from a single audio file.
pub trait MetadataReader: Send + Sync {
    /// Extracts the metadata of one file.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::Unsupported` for files that are not music
    /// and `MetadataError::Failed` when a supported file cannot be read.
    fn read(&self, path: &Path) -> Result<TrackRecord, MetadataError>;
}

/// Asynchronous source of track records.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Fetches the tracks matching a bang query; an empty query means the
    /// whole library.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the source cannot answer.
    async fn fetch(&self, query: &str) -> Result<Vec<TrackRecord>, SourceError>;

    /// Fetches fresh records for specific files.
    ///
    /// Paths the source does not know are left out of the result. The
    /// default fetches the whole library and keeps the requested paths.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the source cannot answer.
    async fn refresh(&self, paths: &[String]) -> Result<Vec<TrackRecord>, SourceError> {
        let wanted: HashSet<&str> = paths.iter().map(String::as_str).collect();
        let tracks = self.fetch("").await?;
        Ok(tracks
            .into_iter()
            .filter(|track| wanted.contains(track.file_path.as_str()))
            .collect())
    }
}

/// Track source backed by a library held in memory.
pub struct InMemorySource {
    library: RwLock<Arc<LibrarySnapshot>>,
    reader: Option<Arc<dyn MetadataReader>>,
}

impl InMemorySource {
    /// Creates a source serving the given library.
    #[must_use]
    pub fn new(library: LibrarySnapshot) -> Self {
        Self {
            library: RwLock::new(Arc::new(library)),
            reader: None,
        }
    }

    /// Re-reads files through `reader` when refreshing instead of
    /// returning the held records.
    #[must_use]
    pub fn with_reader(mut self, reader: Arc<dyn MetadataReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Replaces the served library.
    pub fn replace_library(&self, library: LibrarySnapshot) {
        *self.library.write() = Arc::new(library);
    }

    /// The library currently served.
    #[must_use]
    pub fn library(&self) -> Arc<LibrarySnapshot> {
        self.library.read().clone()
    }

    fn reread(
        &self,
        reader: &dyn MetadataReader,
        paths: &[String],
    ) -> Result<Vec<TrackRecord>, SourceError> {
        let library = self.library();
        let mut fresh = Vec::new();

        for path in paths.iter().filter(|path| library.contains(path)) {
            match reader.read(Path::new(path)) {
                Ok(record) => fresh.push(record),
                Err(MetadataError::Unsupported(unsupported)) => {
                    warn!(path = ?unsupported, "Skipping unsupported file during refresh");
                }
                Err(error) => return Err(error.into()),
            }
        }

        if !fresh.is_empty() {
            self.replace_library(library.with_replaced(&fresh));
        }
        Ok(fresh)
    }
}

#[async_trait]
impl TrackSource for InMemorySource {
    async fn fetch(&self, input: &str) -> Result<Vec<TrackRecord>, SourceError> {
        Ok(query::query(&self.library(), input))
    }

    async fn refresh(&self, paths: &[String]) -> Result<Vec<TrackRecord>, SourceError> {
        match &self.reader {
            Some(reader) => self.reread(reader.as_ref(), paths),
            None => {
                let library = self.library();
                Ok(paths
                    .iter()
                    .filter_map(|path| library.get(path).cloned())
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc};

    use crate::{
        error::domain::{MetadataError, SourceError},
        library::{
            models::TrackRecord,
            snapshot::LibrarySnapshot,
            source::{InMemorySource, MetadataReader, TrackSource},
        },
    };

    fn library() -> LibrarySnapshot {
        LibrarySnapshot::try_from_tracks(vec![
            TrackRecord {
                title: "One".to_string(),
                ..TrackRecord::new("/one.flac")
            },
            TrackRecord {
                title: "Two".to_string(),
                ..TrackRecord::new("/two.flac")
            },
            TrackRecord {
                title: "Cover".to_string(),
                ..TrackRecord::new("/cover.jpg")
            },
        ])
        .unwrap()
    }

    struct RetitlingReader;

    impl MetadataReader for RetitlingReader {
        fn read(&self, path: &Path) -> Result<TrackRecord, MetadataError> {
            if path.extension().is_some_and(|ext| ext == "jpg") {
                return Err(MetadataError::Unsupported(path.to_path_buf()));
            }
            Ok(TrackRecord {
                title: "Re-read".to_string(),
                ..TrackRecord::new(path.to_string_lossy())
            })
        }
    }

    struct BrokenReader;

    impl MetadataReader for BrokenReader {
        fn read(&self, path: &Path) -> Result<TrackRecord, MetadataError> {
            Err(MetadataError::Failed {
                path: path.to_path_buf(),
                reason: "truncated".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_runs_query() {
        let source = InMemorySource::new(library());
        let tracks = source.fetch("!T{Two}").await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].file_path, "/two.flac");
        assert_eq!(source.fetch("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_without_reader_returns_known_paths() {
        let source = InMemorySource::new(library());
        let paths = vec!["/one.flac".to_string(), "/missing.flac".to_string()];
        let tracks = source.refresh(&paths).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "One");
    }

    #[tokio::test]
    async fn test_refresh_with_reader_skips_unsupported() {
        let source = InMemorySource::new(library()).with_reader(Arc::new(RetitlingReader));
        let paths = vec!["/one.flac".to_string(), "/cover.jpg".to_string()];

        let tracks = source.refresh(&paths).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "Re-read");
        assert_eq!(source.library().get("/one.flac").unwrap().title, "Re-read");
        assert_eq!(source.library().get("/cover.jpg").unwrap().title, "Cover");
    }

    #[tokio::test]
    async fn test_refresh_propagates_read_failures() {
        let source = InMemorySource::new(library()).with_reader(Arc::new(BrokenReader));
        let result = source.refresh(&["/one.flac".to_string()]).await;
        assert!(matches!(result, Err(SourceError::Metadata(_))));
    }
}
