//! Geometry kernel abstraction.
//!
//! The pixelization math and disc decomposition live behind the narrow
//! [`GeometryKernel`] trait so the rest of the crate is a thin orchestration
//! layer with a pluggable kernel. [`CubeKernel`] is the native implementation.

use smallvec::SmallVec;
use std::ops::Range;

mod cover;
mod cube;

pub use cube::{CubeKernel, angular_separation, normalize_ang, sindist};

/// A position resolved to a cube face: face number, pixel id, and the (x,y)
/// location on the planar face projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPosition {
    /// Cube face, 0 = top, 1-4 = sides, 5 = bottom.
    pub face: u8,
    /// Pixel identifier in [0, nbins).
    pub ipix: u64,
    /// x coordinate on the face, in [-1,1].
    pub x: f64,
    /// y coordinate on the face, in [-1,1].
    pub y: f64,
}

/// A bounded union of half-open `[lo, hi)` pixel-id ranges covering a query
/// disc.
///
/// The two zones partition the cover: `full` ranges hold only pixels entirely
/// inside the disc, `partial` ranges hold boundary pixels that may contain
/// false positives. The union across both zones is a superset of every pixel
/// intersecting the disc; there are no false negatives. Callers must test
/// membership against both zones.
#[derive(Debug, Clone, Default)]
pub struct DiscCover {
    /// Ranges of pixels entirely inside the disc, sorted and disjoint.
    pub full: SmallVec<[Range<u64>; 16]>,
    /// Ranges of pixels straddling the disc boundary, sorted and disjoint.
    pub partial: SmallVec<[Range<u64>; 16]>,
}

impl DiscCover {
    /// Upper bound on the number of ranges per zone.
    pub const MAX_RANGES_PER_ZONE: usize = 50;

    /// Whether the given pixel id falls in either zone.
    pub fn contains(&self, ipix: u64) -> bool {
        Self::zone_contains(&self.full, ipix) || Self::zone_contains(&self.partial, ipix)
    }

    fn zone_contains(ranges: &[Range<u64>], ipix: u64) -> bool {
        // Ranges are sorted by lower bound; find the last range starting at
        // or below ipix.
        let idx = ranges.partition_point(|r| r.start <= ipix);
        idx > 0 && ipix < ranges[idx - 1].end
    }

    /// Total number of ranges across both zones.
    pub fn range_count(&self) -> usize {
        self.full.len() + self.partial.len()
    }

    /// Total number of pixel ids covered.
    pub fn pixel_count(&self) -> u64 {
        self.full
            .iter()
            .chain(self.partial.iter())
            .map(|r| r.end - r.start)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty() && self.partial.is_empty()
    }
}

/// Contract the pixelization layer programs against.
///
/// Implementations must be internally consistent: `ang2ipix` composed with
/// `ipix2ang` is the identity on pixel ids, and `disc_cover` never omits a
/// pixel intersecting the disc. Inputs are pre-validated by the caller;
/// kernels normalize right ascension themselves and clamp declination.
pub trait GeometryKernel {
    /// Cells along one edge of a cube face.
    fn nside(&self) -> u64;

    /// Angular position (degrees) to pixel id.
    fn ang2ipix(&self, ra: f64, dec: f64) -> u64;

    /// Angular position to pixel id plus face number and face coordinates.
    fn ang2ipix_xy(&self, ra: f64, dec: f64) -> PixelPosition;

    /// Pixel id to its representative (center) angular position, degrees.
    fn ipix2ang(&self, ipix: u64) -> (f64, f64);

    /// Pixel id to face number and the lower-left corner of its cell.
    fn ipix2xy(&self, ipix: u64) -> (u8, f64, f64);

    /// Face-plane coordinates to angular position, degrees.
    fn xy2ang(&self, face: u8, x: f64, y: f64) -> (f64, f64);

    /// Cube face number for an angular position.
    fn face_number(&self, ra: f64, dec: f64) -> u8;

    /// Decompose a spherical cap into a bounded union of pixel-id ranges.
    fn disc_cover(&self, center_ra: f64, center_dec: f64, radius_deg: f64) -> DiscCover;
}
