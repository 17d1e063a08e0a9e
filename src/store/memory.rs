//! In-memory point backend.

use super::{PointBackend, StoreStats};
use crate::error::Result;

/// Volatile backend holding points in a `Vec`. The default storage for a new
/// index.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    points: Vec<(f64, f64)>,
    commit_count: u64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a capacity hint for bulk loads.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            commit_count: 0,
        }
    }
}

impl PointBackend for MemoryBackend {
    fn append(&mut self, ra: f64, dec: f64) -> Result<()> {
        self.points.push((ra, dec));
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        // Nothing to persist; the count keeps batch boundaries observable.
        self.commit_count += 1;
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.points.len())
    }

    fn iter(&self) -> Result<Box<dyn Iterator<Item = (f64, f64)> + '_>> {
        Ok(Box::new(self.points.iter().copied()))
    }

    fn close(&mut self) -> Result<()> {
        self.points.clear();
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            point_count: self.points.len(),
            commit_count: self.commit_count,
            size_bytes: self.points.len() * std::mem::size_of::<(f64, f64)>(),
        })
    }
}
