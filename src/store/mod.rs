//! Point storage for the sky index.
//!
//! This module provides a trait-based abstraction over the (ra, dec) row
//! store, allowing in-memory, file-backed, and external columnar backends
//! behind a consistent API. Writers hold the backend exclusively; concurrent
//! writers must be serialized by the caller.

use crate::error::{CubeskyError, Result};
use log::debug;

mod columnar;
mod memory;

#[cfg(feature = "append-log")]
mod append_log;

pub use columnar::{AdapterKind, ColumnSource, ColumnarBackend, VecColumns, adapter_available};
pub use memory::MemoryBackend;

#[cfg(feature = "append-log")]
pub use append_log::AppendLogBackend;

/// Trait for point storage backends.
///
/// A backend is an ordered, appendable multiset of (ra, dec) rows. Read-only
/// backends (external columnar adapters) return
/// [`CubeskyError::Unsupported`] from [`append`](PointBackend::append).
pub trait PointBackend {
    /// Append one (ra, dec) row in degrees.
    fn append(&mut self, ra: f64, dec: f64) -> Result<()>;

    /// Make all appended rows durable. A no-op for volatile backends, which
    /// still count commits so batching behavior stays observable.
    fn commit(&mut self) -> Result<()>;

    /// Number of stored rows.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Iterate all rows as (ra, dec) pairs in storage order.
    fn iter(&self) -> Result<Box<dyn Iterator<Item = (f64, f64)> + '_>>;

    /// Release the backend's resources. Further operations are undefined.
    fn close(&mut self) -> Result<()>;

    /// Backend statistics.
    fn stats(&self) -> Result<StoreStats>;
}

/// Storage backend statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of stored points.
    pub point_count: usize,
    /// Number of commits performed.
    pub commit_count: u64,
    /// Approximate storage size in bytes.
    pub size_bytes: usize,
}

/// An appendable collection of (ra, dec) points over a pluggable backend.
///
/// Bulk insertion commits the in-flight batch every `commit_interval` rows
/// (50,000 by default) to bound transaction growth during large loads. The
/// periodic commit does not change the final visible content and provides no
/// mid-call visibility guarantee.
pub struct PointStore {
    backend: Box<dyn PointBackend>,
    commit_interval: usize,
}

impl PointStore {
    /// Wrap a backend with the default commit interval.
    pub fn new(backend: Box<dyn PointBackend>) -> Self {
        Self {
            backend,
            commit_interval: crate::config::DEFAULT_COMMIT_INTERVAL,
        }
    }

    /// Create an empty in-memory store.
    pub fn memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    pub fn with_commit_interval(mut self, interval: usize) -> Self {
        assert!(interval > 0, "Commit interval must be greater than zero");
        self.commit_interval = interval;
        self
    }

    /// Append a single point and commit it.
    pub fn insert(&mut self, ra: f64, dec: f64) -> Result<()> {
        Self::check_finite(ra, dec)?;
        self.backend.append(ra, dec)?;
        self.backend.commit()
    }

    /// Append a batch of (ra, dec) pairs with periodic commits.
    pub fn insert_many(&mut self, points: &[(f64, f64)]) -> Result<()> {
        self.bulk_insert(points.iter().copied())
    }

    /// Append parallel ra/dec column slices with periodic commits.
    ///
    /// Fails with [`CubeskyError::InvalidArgument`] if the slice lengths
    /// differ.
    pub fn insert_columns(&mut self, ra: &[f64], dec: &[f64]) -> Result<()> {
        if ra.len() != dec.len() {
            return Err(CubeskyError::InvalidArgument(format!(
                "ra and dec sequences must have equal length ({} vs {})",
                ra.len(),
                dec.len()
            )));
        }
        self.bulk_insert(ra.iter().copied().zip(dec.iter().copied()))
    }

    fn bulk_insert(&mut self, points: impl Iterator<Item = (f64, f64)>) -> Result<()> {
        let mut count = 0usize;
        for (ra, dec) in points {
            Self::check_finite(ra, dec)?;
            self.backend.append(ra, dec)?;
            count += 1;
            if count % self.commit_interval == 0 {
                self.backend.commit()?;
                debug!("committed batch of {} rows ({count} total)", self.commit_interval);
            }
        }
        if count % self.commit_interval != 0 {
            self.backend.commit()?;
        }
        Ok(())
    }

    fn check_finite(ra: f64, dec: f64) -> Result<()> {
        if !ra.is_finite() || !dec.is_finite() {
            return Err(CubeskyError::Domain(format!(
                "point coordinates must be finite (was given ({ra},{dec}))"
            )));
        }
        Ok(())
    }

    /// Number of stored points.
    pub fn count(&self) -> Result<usize> {
        self.backend.len()
    }

    /// Iterate all stored points in storage order.
    pub fn iter_points(&self) -> Result<Box<dyn Iterator<Item = (f64, f64)> + '_>> {
        self.backend.iter()
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.backend.stats()
    }

    pub fn close(&mut self) -> Result<()> {
        self.backend.close()
    }
}

impl std::fmt::Debug for PointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointStore")
            .field("commit_interval", &self.commit_interval)
            .field("count", &self.backend.len().unwrap_or(0))
            .finish()
    }
}
