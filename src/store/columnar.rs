//! Read-only adapters for external tabular point sources.
//!
//! A columnar source only has to expose a named "ra" column, a named "dec"
//! column, a row count, and row iteration. Anything satisfying
//! [`ColumnSource`] can back a sky index without copying its data.

use super::{PointBackend, StoreStats};
use crate::error::{CubeskyError, Result};

/// Kinds of point storage this crate can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// Built-in volatile storage.
    Memory,
    /// Built-in append-only file storage.
    AppendLog,
    /// External columnar tables via [`ColumnSource`].
    Columnar,
}

/// Capability query for optional storage adapters.
///
/// ```rust
/// use cubesky::store::{AdapterKind, adapter_available};
///
/// assert!(adapter_available(AdapterKind::Memory));
/// ```
pub fn adapter_available(kind: AdapterKind) -> bool {
    match kind {
        AdapterKind::Memory | AdapterKind::Columnar => true,
        AdapterKind::AppendLog => cfg!(feature = "append-log"),
    }
}

/// Minimal read contract an external tabular source must satisfy.
pub trait ColumnSource {
    /// Number of rows in the table.
    fn row_count(&self) -> usize;

    /// Whether a column with the given name exists.
    fn has_column(&self, name: &str) -> bool;

    /// Iterate rows as (ra, dec) pairs drawn from the two named columns.
    fn rows<'a>(
        &'a self,
        ra_key: &str,
        dec_key: &str,
    ) -> Result<Box<dyn Iterator<Item = (f64, f64)> + 'a>>;
}

/// A simple owned column table, the built-in [`ColumnSource`].
#[derive(Debug, Default)]
pub struct VecColumns {
    columns: Vec<(String, Vec<f64>)>,
}

impl VecColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named column. All columns must have equal length.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        if let Some((_, first)) = self.columns.first() {
            if first.len() != values.len() {
                return Err(CubeskyError::InvalidArgument(format!(
                    "column length {} does not match existing length {}",
                    values.len(),
                    first.len()
                )));
            }
        }
        self.columns.push((name.into(), values));
        Ok(self)
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }
}

impl ColumnSource for VecColumns {
    fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |(_, v)| v.len())
    }

    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    fn rows<'a>(
        &'a self,
        ra_key: &str,
        dec_key: &str,
    ) -> Result<Box<dyn Iterator<Item = (f64, f64)> + 'a>> {
        let ra = self.column(ra_key).ok_or_else(|| {
            CubeskyError::Config(format!("source has no column named '{ra_key}'"))
        })?;
        let dec = self.column(dec_key).ok_or_else(|| {
            CubeskyError::Config(format!("source has no column named '{dec_key}'"))
        })?;
        Ok(Box::new(
            ra.iter().copied().zip(dec.iter().copied()),
        ))
    }
}

/// Read-only point backend over an external columnar source.
pub struct ColumnarBackend {
    source: Box<dyn ColumnSource>,
    ra_key: String,
    dec_key: String,
}

impl ColumnarBackend {
    /// Attach to a source, verifying both named columns exist.
    pub fn new(
        source: Box<dyn ColumnSource>,
        ra_key: impl Into<String>,
        dec_key: impl Into<String>,
    ) -> Result<Self> {
        let ra_key = ra_key.into();
        let dec_key = dec_key.into();
        for key in [&ra_key, &dec_key] {
            if !source.has_column(key) {
                return Err(CubeskyError::Config(format!(
                    "source has no column named '{key}'"
                )));
            }
        }
        Ok(Self {
            source,
            ra_key,
            dec_key,
        })
    }
}

impl PointBackend for ColumnarBackend {
    fn append(&mut self, _ra: f64, _dec: f64) -> Result<()> {
        Err(CubeskyError::Unsupported(
            "columnar sources are read-only".to_string(),
        ))
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.source.row_count())
    }

    fn iter(&self) -> Result<Box<dyn Iterator<Item = (f64, f64)> + '_>> {
        self.source.rows(&self.ra_key, &self.dec_key)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            point_count: self.source.row_count(),
            commit_count: 0,
            size_bytes: self.source.row_count() * std::mem::size_of::<(f64, f64)>(),
        })
    }
}
