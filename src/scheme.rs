//! The quadrilateralized spherical-cube pixelization scheme.
//!
//! A [`Pixelization`] owns a resolution (`bin_level`) and a geometry kernel
//! handle, validates inputs, and delegates the numeric work to the kernel.
//! It is immutable once constructed and meant to be created once per desired
//! resolution and reused for all conversions and queries.

use crate::config::DEFAULT_BIN_LEVEL;
use crate::error::{CubeskyError, Result};
use crate::kernel::{CubeKernel, DiscCover, GeometryKernel, PixelPosition, normalize_ang};
use geo::Point;
use std::fmt;

/// A quadrilateralized spherical-cube pixelization at a fixed resolution.
///
/// The sphere is divided into six cube faces; `bin_level` is the number of
/// times each face is subdivided by four. At `bin_level = 0` there is one bin
/// per face (6 total); each level quadruples the count per face, giving
/// `nbins = 6 * (2^bin_level)^2` pixels on the sphere. Each pixel has an
/// integer id ("ipix") encoding its face and subdivision path.
///
/// # Example
///
/// ```rust
/// use cubesky::Pixelization;
///
/// let scheme = Pixelization::new(1)?;
/// assert_eq!(scheme.nside(), 2);
/// assert_eq!(scheme.nbins(), 24);
///
/// let ipix = scheme.ang2ipix(45.0, 60.0)?;
/// assert!(ipix < scheme.nbins());
/// # Ok::<(), cubesky::CubeskyError>(())
/// ```
pub struct Pixelization {
    bin_level: u32,
    kernel: Box<dyn GeometryKernel>,
}

impl Pixelization {
    /// Create a scheme with the given bin level, in [0,30].
    ///
    /// Fails with [`CubeskyError::Config`] for an out-of-range level and with
    /// [`CubeskyError::KernelInit`] if the kernel cannot be constructed.
    pub fn new(bin_level: u32) -> Result<Self> {
        Self::validate_bin_level(bin_level)?;
        let kernel = CubeKernel::new(1u64 << bin_level)?;
        Ok(Self {
            bin_level,
            kernel: Box::new(kernel),
        })
    }

    /// Create a scheme at the default resolution (`bin_level = 30`, the Q3C
    /// PostgreSQL plugin default of nside = 2^30).
    pub fn q3c_default() -> Result<Self> {
        Self::new(DEFAULT_BIN_LEVEL)
    }

    /// Create a scheme over a caller-supplied kernel. The kernel's resolution
    /// must agree with `bin_level`.
    pub fn with_kernel(bin_level: u32, kernel: Box<dyn GeometryKernel>) -> Result<Self> {
        Self::validate_bin_level(bin_level)?;
        if kernel.nside() != 1u64 << bin_level {
            return Err(CubeskyError::Config(format!(
                "kernel nside {} does not match bin_level {bin_level}",
                kernel.nside()
            )));
        }
        Ok(Self { bin_level, kernel })
    }

    fn validate_bin_level(bin_level: u32) -> Result<()> {
        if bin_level > 30 {
            return Err(CubeskyError::Config(format!(
                "bin_level must be an integer on [0,30]; was given '{bin_level}'"
            )));
        }
        Ok(())
    }

    /// Subdivision depth of this scheme.
    pub fn bin_level(&self) -> u32 {
        self.bin_level
    }

    /// Number of bins along one edge of a cube face.
    pub fn nside(&self) -> u64 {
        self.kernel.nside()
    }

    /// Total number of bins on the sphere (bins per face times six).
    pub fn nbins(&self) -> u64 {
        let nside = self.nside();
        6 * nside * nside
    }

    /// Convert an (ra, dec) position in degrees to an ipix number.
    ///
    /// Out-of-range finite values are silently normalized (ra wrapped modulo
    /// 360, dec reflected into [-90,90]) before delegation. Contrast with
    /// [`ang2ipix_many`](Self::ang2ipix_many), which rejects out-of-range
    /// input; the asymmetry is a long-standing contract of this API.
    pub fn ang2ipix(&self, ra: f64, dec: f64) -> Result<u64> {
        if !ra.is_finite() || !dec.is_finite() {
            return Err(CubeskyError::Domain(format!(
                "ang2ipix: coordinates must be finite (was given ({ra},{dec}))"
            )));
        }
        let (ra, dec) = if (0.0..=360.0).contains(&ra) && (-90.0..=90.0).contains(&dec) {
            (ra, dec)
        } else {
            normalize_ang(ra, dec)
        };
        Ok(self.kernel.ang2ipix(ra, dec))
    }

    /// Convert a batch of (ra, dec) points to ipix numbers.
    ///
    /// Every dec must lie in [-90,90] and every ra in [0,360], else the call
    /// fails with [`CubeskyError::Domain`].
    pub fn ang2ipix_many(&self, points: &[Point]) -> Result<Vec<u64>> {
        for p in points {
            if !p.y().is_finite() || !(-90.0..=90.0).contains(&p.y()) {
                return Err(CubeskyError::Domain(
                    "ang2ipix: dec out of range [-90,90]".to_string(),
                ));
            }
            if !p.x().is_finite() || !(0.0..=360.0).contains(&p.x()) {
                return Err(CubeskyError::Domain(
                    "ang2ipix: ra out of range [0,360]".to_string(),
                ));
            }
        }
        Ok(points
            .iter()
            .map(|p| self.kernel.ang2ipix(p.x(), p.y()))
            .collect())
    }

    /// Convert an (ra, dec) position to an ipix number plus the face number
    /// and (x, y) location on the square face.
    ///
    /// `dec` must be in [-90,90]; `ra` is unwrapped modulo 360 by the kernel
    /// and does not raise.
    pub fn ang2ipix_xy(&self, ra: f64, dec: f64) -> Result<PixelPosition> {
        if !(-90.0..=90.0).contains(&dec) {
            return Err(CubeskyError::Domain(format!(
                "dec must be in the range [-90,90] (was given '{dec}')"
            )));
        }
        if !ra.is_finite() {
            return Err(CubeskyError::Domain(format!(
                "ra must be finite (was given '{ra}')"
            )));
        }
        Ok(self.kernel.ang2ipix_xy(ra, dec))
    }

    /// Convert an ipix number to (ra, dec) in degrees.
    ///
    /// The returned angle is the pixel's representative position; it need not
    /// equal any prior input angle, but always satisfies
    /// `ang2ipix(ipix2ang(ipix)) == ipix`.
    pub fn ipix2ang(&self, ipix: u64) -> Result<(f64, f64)> {
        self.check_ipix(ipix)?;
        Ok(self.kernel.ipix2ang(ipix))
    }

    /// Convert an ipix number to the (x, y) lower-left corner of its cell on
    /// the corresponding face; returns (face, x, y).
    pub fn ipix2xy(&self, ipix: u64) -> Result<(u8, f64, f64)> {
        self.check_ipix(ipix)?;
        Ok(self.kernel.ipix2xy(ipix))
    }

    /// Convert an (x, y) coordinate pair on the given face to (ra, dec).
    ///
    /// `face` must be in [0,5]; `x` and `y` must each be in [-1,1].
    pub fn xy2ang(&self, face: u8, x: f64, y: f64) -> Result<(f64, f64)> {
        self.check_face(face)?;
        self.check_face_coord(x, y)?;
        Ok(self.kernel.xy2ang(face, x, y))
    }

    /// Batch form of [`xy2ang`](Self::xy2ang) over (x, y) pairs on one face.
    pub fn xy2ang_many(&self, face: u8, points: &[(f64, f64)]) -> Result<Vec<(f64, f64)>> {
        self.check_face(face)?;
        for &(x, y) in points {
            self.check_face_coord(x, y)?;
        }
        Ok(points
            .iter()
            .map(|&(x, y)| self.kernel.xy2ang(face, x, y))
            .collect())
    }

    /// Convert an (x, y) coordinate pair on the given face to an ipix value.
    pub fn xy2ipix(&self, face: u8, x: f64, y: f64) -> Result<u64> {
        let (ra, dec) = self.xy2ang(face, x, y)?;
        self.ang2ipix(ra, dec)
    }

    /// Cube face number for the provided coordinate, in [0,5].
    ///
    /// `dec` must be in [-90,90] and `ra` in [-360,360].
    pub fn face_number(&self, ra: f64, dec: f64) -> Result<u8> {
        if !(-90.0..=90.0).contains(&dec) {
            return Err(CubeskyError::Domain(format!(
                "dec must be normalized to [-90,90]; was given '{dec}'"
            )));
        }
        if !(-360.0..=360.0).contains(&ra) {
            return Err(CubeskyError::Domain(format!(
                "ra must be normalized to [0,360]; was given '{ra}'"
            )));
        }
        Ok(self.kernel.face_number(ra.rem_euclid(360.0), dec))
    }

    /// Cube face number of the given pixel.
    pub fn face_number_of(&self, ipix: u64) -> Result<u8> {
        self.check_ipix(ipix)?;
        let (ra, dec) = self.kernel.ipix2ang(ipix);
        Ok(self.kernel.face_number(ra, dec))
    }

    /// Average pixel area in steradians, `4π / nbins`.
    ///
    /// Pixels are not exactly equal-area but are very close at a fixed bin
    /// level; this uniform value is a good approximation for any one pixel.
    /// Callers must not assume per-pixel precision.
    pub fn approximate_pixel_area(&self) -> f64 {
        4.0 * std::f64::consts::PI / self.nbins() as f64
    }

    /// Ipix value of the ancestor-cell center at the given subdivision depth
    /// covering the specified (ra, dec). `depth` must be in [1,30].
    pub fn pixel_center_at_depth(&self, ra: f64, dec: f64, depth: u32) -> Result<u64> {
        if !(1..=30).contains(&depth) {
            return Err(CubeskyError::Domain(format!(
                "depth {depth} is out of the range [1,30]"
            )));
        }
        let ipix = self.ang2ipix(ra, dec)?;
        Ok((ipix >> (2 * depth) << (2 * depth)) + (1u64 << (2 * (depth - 1))) - 1)
    }

    /// Corner vertices of the pixel's cell mapped back to (ra, dec) degrees,
    /// in counter-clockwise order from the lower-left corner. When
    /// `duplicate_first` is set the first vertex is repeated as the last
    /// element to close the ring.
    ///
    /// Edges are straight lines in face-plane coordinates before
    /// back-projection, not great-circle arcs; callers needing geodesic
    /// accuracy must subdivide the edges themselves.
    pub fn pixel_polygon(&self, ipix: u64, duplicate_first: bool) -> Result<Vec<(f64, f64)>> {
        let (face, x, y) = self.ipix2xy(ipix)?;
        let d = 2.0 / self.nside() as f64;

        let mut corners = vec![(x, y), (x + d, y), (x + d, y + d), (x, y + d)];
        if duplicate_first {
            corners.push((x, y));
        }
        self.xy2ang_many(face, &corners)
    }

    /// Interval cover for the disc `(center_ra, center_dec, radius_deg)`.
    ///
    /// The union of both zones is a conservative superset of every pixel
    /// intersecting the disc.
    pub fn disc_cover(&self, center_ra: f64, center_dec: f64, radius_deg: f64) -> Result<DiscCover> {
        if !center_ra.is_finite() || !center_dec.is_finite() || !radius_deg.is_finite() {
            return Err(CubeskyError::Domain(
                "disc center and radius must be finite".to_string(),
            ));
        }
        if radius_deg < 0.0 {
            return Err(CubeskyError::Domain(format!(
                "radius must be non-negative; was given '{radius_deg}'"
            )));
        }
        Ok(self.kernel.disc_cover(center_ra, center_dec, radius_deg))
    }

    fn check_ipix(&self, ipix: u64) -> Result<()> {
        if ipix >= self.nbins() {
            return Err(CubeskyError::Domain(format!(
                "ipix {ipix} is out of bounds for this scheme; range: [0,{}]",
                self.nbins() - 1
            )));
        }
        Ok(())
    }

    fn check_face(&self, face: u8) -> Result<()> {
        if face > 5 {
            return Err(CubeskyError::Domain(format!(
                "face number must be an integer between 0 and 5; was given '{face}'"
            )));
        }
        Ok(())
    }

    fn check_face_coord(&self, x: f64, y: f64) -> Result<()> {
        if !(-1.0..=1.0).contains(&x) || !(-1.0..=1.0).contains(&y) {
            return Err(CubeskyError::Domain(format!(
                "x and y must be in the range [-1,1]; was given ({x},{y})"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Pixelization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pixelization")
            .field("bin_level", &self.bin_level)
            .field("nside", &self.nside())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CubeskyError;

    #[test]
    fn test_derived_constants() {
        for bin_level in 0..=30u32 {
            let scheme = Pixelization::new(bin_level).unwrap();
            assert_eq!(scheme.nside(), 1u64 << bin_level);
            assert_eq!(scheme.nbins(), 6 * scheme.nside() * scheme.nside());
        }
    }

    #[test]
    fn test_bin_level_zero_and_one() {
        let scheme = Pixelization::new(0).unwrap();
        assert_eq!(scheme.nside(), 1);
        assert_eq!(scheme.nbins(), 6);
        assert!(scheme.ang2ipix(0.0, 0.0).unwrap() < 6);

        let scheme = Pixelization::new(1).unwrap();
        assert_eq!(scheme.nbins(), 24);
    }

    #[test]
    fn test_invalid_bin_level() {
        assert!(matches!(
            Pixelization::new(31),
            Err(CubeskyError::Config(_))
        ));
    }

    #[test]
    fn test_scalar_normalizes_vector_rejects() {
        let scheme = Pixelization::new(4).unwrap();

        // Scalar input out of range is normalized, not rejected.
        let a = scheme.ang2ipix(0.0, 91.0).unwrap();
        let b = scheme.ang2ipix(180.0, 89.0).unwrap();
        assert_eq!(a, b);

        // Vector input with the same dec raises.
        let points = vec![Point::new(0.0, 91.0)];
        assert!(matches!(
            scheme.ang2ipix_many(&points),
            Err(CubeskyError::Domain(_))
        ));

        let points = vec![Point::new(361.0, 0.0)];
        assert!(matches!(
            scheme.ang2ipix_many(&points),
            Err(CubeskyError::Domain(_))
        ));
    }

    #[test]
    fn test_vector_matches_scalar_in_range() {
        let scheme = Pixelization::new(6).unwrap();
        let points = vec![Point::new(12.0, 34.0), Point::new(200.0, -56.0)];
        let many = scheme.ang2ipix_many(&points).unwrap();
        for (p, &ipix) in points.iter().zip(&many) {
            assert_eq!(scheme.ang2ipix(p.x(), p.y()).unwrap(), ipix);
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let scheme = Pixelization::new(4).unwrap();
        assert!(scheme.ang2ipix(f64::NAN, 0.0).is_err());
        assert!(scheme.ang2ipix(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_pixel_containment_roundtrip() {
        let scheme = Pixelization::new(4).unwrap();
        for ipix in 0..scheme.nbins() {
            let (ra, dec) = scheme.ipix2ang(ipix).unwrap();
            assert_eq!(scheme.ang2ipix(ra, dec).unwrap(), ipix);
        }
    }

    #[test]
    fn test_ipix_bounds_checked() {
        let scheme = Pixelization::new(2).unwrap();
        assert!(scheme.ipix2ang(scheme.nbins()).is_err());
        assert!(scheme.ipix2xy(scheme.nbins()).is_err());
        assert!(scheme.face_number_of(scheme.nbins()).is_err());
        assert!(scheme.ipix2ang(scheme.nbins() - 1).is_ok());
    }

    #[test]
    fn test_xy2ipix_composition() {
        let scheme = Pixelization::new(5).unwrap();
        for &(face, x, y) in &[(0u8, 0.25, -0.75), (3, 0.0, 0.0), (5, -0.99, 0.99)] {
            let (ra, dec) = scheme.xy2ang(face, x, y).unwrap();
            assert_eq!(
                scheme.xy2ipix(face, x, y).unwrap(),
                scheme.ang2ipix(ra, dec).unwrap()
            );
        }
    }

    #[test]
    fn test_xy2ang_validation() {
        let scheme = Pixelization::new(2).unwrap();
        assert!(scheme.xy2ang(6, 0.0, 0.0).is_err());
        assert!(scheme.xy2ang(0, 1.5, 0.0).is_err());
        assert!(scheme.xy2ang(0, 0.0, -1.01).is_err());
        assert!(scheme.xy2ang(0, 1.0, -1.0).is_ok());
    }

    #[test]
    fn test_face_number_validation() {
        let scheme = Pixelization::new(2).unwrap();
        assert!(scheme.face_number(0.0, 91.0).is_err());
        assert!(scheme.face_number(361.0, 0.0).is_err());
        // Negative ra down to -360 is accepted.
        assert_eq!(
            scheme.face_number(-90.0, 0.0).unwrap(),
            scheme.face_number(270.0, 0.0).unwrap()
        );
    }

    #[test]
    fn test_face_number_of_pixel_agrees() {
        let scheme = Pixelization::new(3).unwrap();
        let bins_per_face = scheme.nbins() / 6;
        for face in 0..6u64 {
            let ipix = face * bins_per_face;
            assert_eq!(scheme.face_number_of(ipix).unwrap(), face as u8);
        }
    }

    #[test]
    fn test_approximate_pixel_area() {
        let scheme = Pixelization::new(0).unwrap();
        let expected = 4.0 * std::f64::consts::PI / 6.0;
        assert!((scheme.approximate_pixel_area() - expected).abs() < 1e-15);

        let fine = Pixelization::new(10).unwrap();
        assert!(fine.approximate_pixel_area() < scheme.approximate_pixel_area());
    }

    #[test]
    fn test_pixel_center_at_depth_validation() {
        let scheme = Pixelization::new(8).unwrap();
        assert!(scheme.pixel_center_at_depth(10.0, 10.0, 0).is_err());
        assert!(scheme.pixel_center_at_depth(10.0, 10.0, 31).is_err());
        assert!(scheme.pixel_center_at_depth(10.0, 10.0, 1).is_ok());
    }

    #[test]
    fn test_pixel_center_at_depth_idempotent() {
        let scheme = Pixelization::new(8).unwrap();
        for depth in 1..=4u32 {
            let center = scheme.pixel_center_at_depth(123.0, -45.0, depth).unwrap();
            let (ra, dec) = scheme.ipix2ang(center).unwrap();
            assert_eq!(
                scheme.pixel_center_at_depth(ra, dec, depth).unwrap(),
                center
            );
        }
    }

    #[test]
    fn test_pixel_polygon() {
        let scheme = Pixelization::new(3).unwrap();
        let ipix = scheme.ang2ipix(45.0, 30.0).unwrap();

        let open = scheme.pixel_polygon(ipix, false).unwrap();
        assert_eq!(open.len(), 4);

        let closed = scheme.pixel_polygon(ipix, true).unwrap();
        assert_eq!(closed.len(), 5);
        assert_eq!(closed[0], closed[4]);

        // Interior of the cell maps back to the same pixel.
        let (face, x, y) = scheme.ipix2xy(ipix).unwrap();
        let d = 2.0 / scheme.nside() as f64;
        let mid = scheme.xy2ipix(face, x + d / 2.0, y + d / 2.0).unwrap();
        assert_eq!(mid, ipix);

        assert!(scheme.pixel_polygon(scheme.nbins(), false).is_err());
    }

    #[test]
    fn test_debug_names_bin_level() {
        let scheme = Pixelization::new(7).unwrap();
        let repr = format!("{scheme:?}");
        assert!(repr.contains("bin_level"));
        assert!(repr.contains('7'));
    }
}
