//! File-backed point backend using an append-only record log.
//!
//! Records are fixed-size bincode-encoded (ra, dec) pairs. On open, an
//! existing log is replayed into memory; appends go through a buffered
//! writer and become durable on commit.

use super::{PointBackend, StoreStats};
use crate::error::{CubeskyError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

// Two little-endian f64 values per record.
const RECORD_SIZE: u64 = 16;

#[derive(Debug, Serialize, Deserialize)]
struct PointRecord {
    ra: f64,
    dec: f64,
}

/// Persistent backend over an append-only file of point records.
pub struct AppendLogBackend {
    points: Vec<(f64, f64)>,
    writer: BufWriter<File>,
    path: PathBuf,
    commit_count: u64,
}

impl AppendLogBackend {
    /// Open the log at `path`, creating it if absent. An existing file that
    /// cannot be decoded as a point log fails with
    /// [`CubeskyError::StorageOpen`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        let size = file.metadata()?.len();
        if size % RECORD_SIZE != 0 {
            return Err(CubeskyError::StorageOpen {
                path,
                reason: format!("file length {size} is not a multiple of the record size"),
            });
        }

        let points = Self::replay(&path, size)?;
        if !points.is_empty() {
            debug!("replayed {} points from {:?}", points.len(), path);
        }

        Ok(Self {
            points,
            writer: BufWriter::new(file),
            path,
            commit_count: 0,
        })
    }

    fn replay(path: &Path, size: u64) -> Result<Vec<(f64, f64)>> {
        let mut points = Vec::with_capacity((size / RECORD_SIZE) as usize);
        let mut reader = BufReader::new(File::open(path)?);

        loop {
            match bincode::deserialize_from::<_, PointRecord>(&mut reader) {
                Ok(record) => {
                    if !record.ra.is_finite() || !record.dec.is_finite() {
                        return Err(CubeskyError::StorageOpen {
                            path: path.to_path_buf(),
                            reason: format!(
                                "corrupt record {} holds non-finite coordinates",
                                points.len()
                            ),
                        });
                    }
                    points.push((record.ra, record.dec));
                }
                Err(e) => match *e {
                    bincode::ErrorKind::Io(ref io) if io.kind() == ErrorKind::UnexpectedEof => {
                        break;
                    }
                    _ => {
                        return Err(CubeskyError::StorageOpen {
                            path: path.to_path_buf(),
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        Ok(points)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PointBackend for AppendLogBackend {
    fn append(&mut self, ra: f64, dec: f64) -> Result<()> {
        let record = PointRecord { ra, dec };
        bincode::serialize_into(&mut self.writer, &record)
            .map_err(|e| CubeskyError::Serialization(e.to_string()))?;
        self.points.push((ra, dec));
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
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
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.points.clear();
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            point_count: self.points.len(),
            commit_count: self.commit_count,
            size_bytes: (self.points.len() as u64 * RECORD_SIZE) as usize,
        })
    }
}

impl Drop for AppendLogBackend {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
