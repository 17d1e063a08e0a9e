//! Builder for flexible index construction.
//!
//! Chooses the resolution and the storage backend: in-memory (default), an
//! append-only point log on disk, or an external columnar source.

use crate::config::Config;
use crate::error::{CubeskyError, Result};
use crate::index::SkyIndex;
use crate::scheme::Pixelization;
use crate::store::{ColumnSource, ColumnarBackend, MemoryBackend, PointBackend, PointStore};
#[cfg(feature = "append-log")]
use std::path::PathBuf;

/// Builder for a [`SkyIndex`].
///
/// ```rust
/// use cubesky::SkyIndexBuilder;
///
/// let index = SkyIndexBuilder::new().bin_level(12).build()?;
/// assert_eq!(index.scheme().nside(), 4096);
/// # Ok::<(), cubesky::CubeskyError>(())
/// ```
pub struct SkyIndexBuilder {
    config: Config,
    #[cfg(feature = "append-log")]
    path: Option<PathBuf>,
    source: Option<Box<dyn ColumnSource>>,
}

impl SkyIndexBuilder {
    /// Create a builder with default in-memory configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            #[cfg(feature = "append-log")]
            path: None,
            source: None,
        }
    }

    /// Set the full configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the pixelization resolution.
    pub fn bin_level(mut self, bin_level: u32) -> Self {
        self.config.bin_level = bin_level;
        self
    }

    /// Back the store with an append-only point log at `path`. The file is
    /// created if needed and replayed on startup.
    #[cfg(feature = "append-log")]
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Back the store with a read-only external columnar source. The columns
    /// named by the configuration (`ra`/`dec` by default) must exist.
    pub fn source(mut self, source: Box<dyn ColumnSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Configure for in-memory storage with no persistence.
    pub fn in_memory(mut self) -> Self {
        #[cfg(feature = "append-log")]
        {
            self.path = None;
        }
        self.source = None;
        self
    }

    /// Build the index. Opens or attaches the configured storage.
    pub fn build(self) -> Result<SkyIndex> {
        self.config
            .validate()
            .map_err(CubeskyError::Config)?;

        #[cfg(feature = "append-log")]
        if self.path.is_some() && self.source.is_some() {
            return Err(CubeskyError::InvalidArgument(
                "a log path and a columnar source are mutually exclusive".to_string(),
            ));
        }

        let scheme = Pixelization::new(self.config.bin_level)?;

        let backend: Box<dyn PointBackend> = if let Some(source) = self.source {
            Box::new(ColumnarBackend::new(
                source,
                self.config.ra_key.clone(),
                self.config.dec_key.clone(),
            )?)
        } else {
            #[cfg(feature = "append-log")]
            if let Some(path) = self.path {
                let backend = crate::store::AppendLogBackend::open(path)?;
                let store =
                    PointStore::new(Box::new(backend)).with_commit_interval(self.config.commit_interval);
                return Ok(SkyIndex::new(scheme, store));
            }
            Box::new(MemoryBackend::new())
        };

        let store = PointStore::new(backend).with_commit_interval(self.config.commit_interval);
        Ok(SkyIndex::new(scheme, store))
    }
}

impl Default for SkyIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::VecColumns;

    #[test]
    fn test_builder_default_is_memory() {
        let mut index = SkyIndexBuilder::new().bin_level(4).build().unwrap();
        index.insert(1.0, 2.0).unwrap();
        assert_eq!(index.count().unwrap(), 1);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = SkyIndexBuilder::new().bin_level(31).build();
        assert!(matches!(result, Err(CubeskyError::Config(_))));
    }

    #[test]
    fn test_builder_with_config() {
        let config = Config::default().with_bin_level(6).with_commit_interval(10);
        let index = SkyIndexBuilder::new().config(config).build().unwrap();
        assert_eq!(index.scheme().bin_level(), 6);
    }

    #[test]
    fn test_builder_with_columnar_source() {
        let source = VecColumns::new()
            .with_column("ra", vec![10.0, 20.0])
            .unwrap()
            .with_column("dec", vec![0.0, 0.0])
            .unwrap();

        let index = SkyIndexBuilder::new()
            .bin_level(8)
            .source(Box::new(source))
            .build()
            .unwrap();

        assert_eq!(index.count().unwrap(), 2);
        let hits = index.radial_query(10.0, 0.0, 1.0).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_builder_columnar_missing_column() {
        let source = VecColumns::new()
            .with_column("alpha", vec![1.0])
            .unwrap();
        let result = SkyIndexBuilder::new().source(Box::new(source)).build();
        assert!(matches!(result, Err(CubeskyError::Config(_))));
    }

    #[cfg(feature = "append-log")]
    #[test]
    fn test_builder_path_and_source_exclusive() {
        let source = VecColumns::new().with_column("ra", vec![]).unwrap();
        let result = SkyIndexBuilder::new()
            .path("/tmp/some.log")
            .source(Box::new(source))
            .build();
        assert!(matches!(result, Err(CubeskyError::InvalidArgument(_))));
    }

    #[cfg(feature = "append-log")]
    #[test]
    fn test_builder_in_memory_clears_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = SkyIndexBuilder::new()
            .bin_level(4)
            .path(dir.path().join("points.log"))
            .in_memory()
            .build()
            .unwrap();
        index.insert(0.0, 0.0).unwrap();
        assert!(!dir.path().join("points.log").exists());
    }
}
