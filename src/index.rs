//! The sky index: a pixelization scheme over a point store, with radial
//! queries.

use crate::builder::SkyIndexBuilder;
use crate::error::Result;
use crate::kernel::sindist;
use crate::scheme::Pixelization;
use crate::store::{PointStore, StoreStats};
use geo::Point;
use log::trace;

/// Spatial index over (ra, dec) points supporting radial queries.
///
/// Composes a [`Pixelization`] with a [`PointStore`]. Ingestion and
/// coordinate conversion are independent; the radial query uses both: stored
/// points are mapped to pixel ids and coarsely filtered against the kernel's
/// interval cover, then refined with the exact chord-distance metric.
///
/// `SkyIndex` is single-threaded by design: writers take `&mut self` and
/// callers provide their own serialization for shared use.
///
/// # Example
///
/// ```rust
/// use cubesky::SkyIndex;
///
/// let mut index = SkyIndex::builder().bin_level(10).build()?;
/// index.insert(180.0, 0.0)?;
/// index.insert(10.0, 45.0)?;
///
/// let hits = index.radial_query(180.0, 0.0, 1.0)?;
/// assert_eq!(hits.len(), 1);
/// # Ok::<(), cubesky::CubeskyError>(())
/// ```
pub struct SkyIndex {
    scheme: Pixelization,
    store: PointStore,
}

impl SkyIndex {
    /// Compose an index from an existing scheme and store.
    pub fn new(scheme: Pixelization, store: PointStore) -> Self {
        Self { scheme, store }
    }

    /// Builder for custom configuration and storage.
    pub fn builder() -> SkyIndexBuilder {
        SkyIndexBuilder::new()
    }

    /// Create an empty in-memory index at the default resolution.
    pub fn memory() -> Result<Self> {
        Ok(Self::new(Pixelization::q3c_default()?, PointStore::memory()))
    }

    /// Open an index backed by an append-only point log at `path`, creating
    /// the file if absent and replaying it if present.
    #[cfg(feature = "append-log")]
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        SkyIndexBuilder::new().path(path.as_ref().to_path_buf()).build()
    }

    /// The pixelization scheme backing this index.
    pub fn scheme(&self) -> &Pixelization {
        &self.scheme
    }

    /// Append one point, in degrees.
    pub fn insert(&mut self, ra: f64, dec: f64) -> Result<()> {
        self.store.insert(ra, dec)
    }

    /// Append one point given as a `geo::Point` (x = ra, y = dec).
    pub fn insert_point(&mut self, point: &Point) -> Result<()> {
        self.store.insert(point.x(), point.y())
    }

    /// Append a batch of (ra, dec) pairs with periodic commits.
    pub fn insert_many(&mut self, points: &[(f64, f64)]) -> Result<()> {
        self.store.insert_many(points)
    }

    /// Append parallel ra/dec column slices with periodic commits.
    pub fn insert_columns(&mut self, ra: &[f64], dec: &[f64]) -> Result<()> {
        self.store.insert_columns(ra, dec)
    }

    /// Number of stored points.
    pub fn count(&self) -> Result<usize> {
        self.store.count()
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }

    /// Release storage resources.
    pub fn close(&mut self) -> Result<()> {
        self.store.close()
    }

    /// All stored points within `radius_deg` of `(center_ra, center_dec)`.
    ///
    /// Stateless per call: the disc is decomposed into a bounded union of
    /// pixel-id intervals, every stored point is scanned and coarsely tested
    /// for interval membership, and survivors are refined with the exact
    /// chord-distance metric `sindist < sin²(radius/2)`. The coarse step is
    /// integer comparisons only; the refine step removes the false positives
    /// cell quantization lets through at disc boundaries.
    ///
    /// Returns points in storage order; an empty result is not an error.
    pub fn radial_query(&self, center_ra: f64, center_dec: f64, radius_deg: f64) -> Result<Vec<Point>> {
        let cover = self.scheme.disc_cover(center_ra, center_dec, radius_deg)?;
        let threshold = (radius_deg.to_radians() / 2.0).sin().powi(2);

        let mut matches = Vec::new();
        let mut scanned = 0usize;
        for (ra, dec) in self.store.iter_points()? {
            scanned += 1;
            let ipix = self.scheme.ang2ipix(ra, dec)?;
            if cover.contains(ipix) && sindist(ra, dec, center_ra, center_dec) < threshold {
                matches.push(Point::new(ra, dec));
            }
        }

        trace!(
            "radial_query ({center_ra},{center_dec}) r={radius_deg}: {} of {scanned} points matched \
             against {} cover ranges",
            matches.len(),
            cover.range_count(),
        );

        Ok(matches)
    }
}

impl std::fmt::Debug for SkyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkyIndex")
            .field("bin_level", &self.scheme.bin_level())
            .field("count", &self.store.count().unwrap_or(0))
            .finish()
    }
}
