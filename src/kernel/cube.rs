//! Native quadrilateralized spherical-cube kernel.
//!
//! The sphere is enclosed in a cube; positions are gnomonically projected
//! onto the six faces and quantized into a quadtree grid per face. Pixel ids
//! encode the face in the high bits and the bit-interleaved (x,y) cell path
//! below, so masking low bits walks up the subdivision hierarchy.

use super::{DiscCover, GeometryKernel, PixelPosition};
use crate::error::{CubeskyError, Result};

/// Highest supported subdivision level; pixel ids stay below 6 * 4^30.
pub(crate) const MAX_BIN_LEVEL: u32 = 30;

// Per-face orthonormal frames: [normal, u axis, v axis]. Faces 1-4 are the
// equatorial faces centered at ra = 0, 90, 180, 270; face 0 is the north
// cap, face 5 the south cap.
const FACE_AXES: [[[f64; 3]; 3]; 6] = [
    [[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]],
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    [[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
    [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]],
    [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
    [[0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
];

/// The built-in geometry kernel.
#[derive(Debug, Clone)]
pub struct CubeKernel {
    nside: u64,
    bin_level: u32,
}

impl CubeKernel {
    /// Create a kernel for the given resolution. `nside` must be a power of
    /// two no greater than 2^30.
    pub fn new(nside: u64) -> Result<Self> {
        if nside == 0 || !nside.is_power_of_two() || nside > (1 << MAX_BIN_LEVEL) {
            return Err(CubeskyError::KernelInit(format!(
                "nside must be a power of two in [1, 2^{MAX_BIN_LEVEL}]; was given '{nside}'"
            )));
        }

        Ok(Self {
            nside,
            bin_level: nside.trailing_zeros(),
        })
    }

    pub(crate) fn bin_level(&self) -> u32 {
        self.bin_level
    }

    /// Pixels per face.
    fn bins_per_face(&self) -> u64 {
        self.nside * self.nside
    }

    /// Face-local cell width.
    fn cell_step(&self) -> f64 {
        2.0 / self.nside as f64
    }

    fn quantize(&self, t: f64) -> u64 {
        // t in [-1,1]; the cast saturates negative float fuzz to 0.
        let bin = ((t + 1.0) / self.cell_step()) as u64;
        bin.min(self.nside - 1)
    }

    fn project(&self, v: [f64; 3]) -> (u8, f64, f64) {
        let face = face_of(v);
        let axes = &FACE_AXES[face as usize];
        let w = dot(v, axes[0]);
        let x = (dot(v, axes[1]) / w).clamp(-1.0, 1.0);
        let y = (dot(v, axes[2]) / w).clamp(-1.0, 1.0);
        (face, x, y)
    }

    fn unproject(&self, face: u8, x: f64, y: f64) -> (f64, f64) {
        let axes = &FACE_AXES[face as usize];
        let mut v = [0.0f64; 3];
        for k in 0..3 {
            v[k] = axes[0][k] + x * axes[1][k] + y * axes[2][k];
        }
        let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        let ra = v[1].atan2(v[0]).to_degrees().rem_euclid(360.0);
        let dec = (v[2] / norm).asin().to_degrees();
        (ra, dec)
    }
}

impl GeometryKernel for CubeKernel {
    fn nside(&self) -> u64 {
        self.nside
    }

    fn ang2ipix(&self, ra: f64, dec: f64) -> u64 {
        self.ang2ipix_xy(ra, dec).ipix
    }

    fn ang2ipix_xy(&self, ra: f64, dec: f64) -> PixelPosition {
        // RA is unwrapped here; declination is clamped at the poles.
        let ra = ra.rem_euclid(360.0);
        let dec = dec.clamp(-90.0, 90.0);

        let v = unit_vector(ra, dec);
        let (face, x, y) = self.project(v);
        let i = self.quantize(x);
        let j = self.quantize(y);
        let ipix = face as u64 * self.bins_per_face() + (spread_bits(i) | spread_bits(j) << 1);

        PixelPosition { face, ipix, x, y }
    }

    fn ipix2ang(&self, ipix: u64) -> (f64, f64) {
        let (face, x, y) = self.ipix2xy(ipix);
        let half = self.cell_step() / 2.0;
        self.unproject(face, x + half, y + half)
    }

    fn ipix2xy(&self, ipix: u64) -> (u8, f64, f64) {
        let face = (ipix / self.bins_per_face()) as u8;
        let within = ipix % self.bins_per_face();
        let i = compact_bits(within);
        let j = compact_bits(within >> 1);
        let step = self.cell_step();
        (face, i as f64 * step - 1.0, j as f64 * step - 1.0)
    }

    fn xy2ang(&self, face: u8, x: f64, y: f64) -> (f64, f64) {
        self.unproject(face, x, y)
    }

    fn face_number(&self, ra: f64, dec: f64) -> u8 {
        let (ra, dec) = normalize_ang(ra, dec);
        face_of(unit_vector(ra, dec))
    }

    fn disc_cover(&self, center_ra: f64, center_dec: f64, radius_deg: f64) -> DiscCover {
        super::cover::disc_cover(self, center_ra, center_dec, radius_deg)
    }
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn unit_vector(ra: f64, dec: f64) -> [f64; 3] {
    let (ra, dec) = (ra.to_radians(), dec.to_radians());
    let c = dec.cos();
    [c * ra.cos(), c * ra.sin(), dec.sin()]
}

fn face_of(v: [f64; 3]) -> u8 {
    let (ax, ay, az) = (v[0].abs(), v[1].abs(), v[2].abs());
    if az >= ax && az >= ay {
        if v[2] >= 0.0 { 0 } else { 5 }
    } else if ax >= ay {
        if v[0] >= 0.0 { 1 } else { 3 }
    } else if v[1] >= 0.0 {
        2
    } else {
        4
    }
}

/// Interleave the low 32 bits of `n` into the even bit positions.
fn spread_bits(mut n: u64) -> u64 {
    n &= 0xffff_ffff;
    n = (n | (n << 16)) & 0x0000_ffff_0000_ffff;
    n = (n | (n << 8)) & 0x00ff_00ff_00ff_00ff;
    n = (n | (n << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    n = (n | (n << 2)) & 0x3333_3333_3333_3333;
    n = (n | (n << 1)) & 0x5555_5555_5555_5555;
    n
}

/// Inverse of [`spread_bits`]: gather the even bit positions.
fn compact_bits(mut n: u64) -> u64 {
    n &= 0x5555_5555_5555_5555;
    n = (n | (n >> 1)) & 0x3333_3333_3333_3333;
    n = (n | (n >> 2)) & 0x0f0f_0f0f_0f0f_0f0f;
    n = (n | (n >> 4)) & 0x00ff_00ff_00ff_00ff;
    n = (n | (n >> 8)) & 0x0000_ffff_0000_ffff;
    n = (n | (n >> 16)) & 0x0000_0000_ffff_ffff;
    n
}

pub(crate) fn morton(i: u64, j: u64) -> u64 {
    spread_bits(i) | spread_bits(j) << 1
}

/// Normalized chord-distance metric between two sky positions (degrees).
///
/// Returns `sin²(θ/2)` for angular separation θ, i.e. the haversine
/// half-angle quantity. Monotonic in θ, so disc membership reduces to
/// comparing against `sin²(radius/2)` without computing the angle.
pub fn sindist(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let sd = ((dec2 - dec1).to_radians() / 2.0).sin();
    let sr = ((ra2 - ra1).to_radians() / 2.0).sin();
    sd * sd + dec1.to_radians().cos() * dec2.to_radians().cos() * sr * sr
}

/// True angular separation between two sky positions, in degrees.
pub fn angular_separation(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let s = sindist(ra1, dec1, ra2, dec2).clamp(0.0, 1.0);
    2.0 * s.sqrt().asin().to_degrees()
}

/// Normalize a sky position: ra wrapped into [0,360), dec reflected through
/// the poles into [-90,90].
pub fn normalize_ang(ra: f64, dec: f64) -> (f64, f64) {
    let mut ra = ra;
    // Fold dec into [-180,180), then reflect over-the-pole values.
    let mut dec = (dec + 180.0).rem_euclid(360.0) - 180.0;
    if dec > 90.0 {
        dec = 180.0 - dec;
        ra += 180.0;
    } else if dec < -90.0 {
        dec = -180.0 - dec;
        ra += 180.0;
    }
    (ra.rem_euclid(360.0), dec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_init_validation() {
        assert!(CubeKernel::new(1).is_ok());
        assert!(CubeKernel::new(1 << 30).is_ok());
        assert!(CubeKernel::new(0).is_err());
        assert!(CubeKernel::new(3).is_err());
        assert!(CubeKernel::new(1 << 31).is_err());
    }

    #[test]
    fn test_face_assignment() {
        let kernel = CubeKernel::new(16).unwrap();
        assert_eq!(kernel.face_number(0.0, 89.0), 0);
        assert_eq!(kernel.face_number(0.0, 0.0), 1);
        assert_eq!(kernel.face_number(90.0, 0.0), 2);
        assert_eq!(kernel.face_number(180.0, 0.0), 3);
        assert_eq!(kernel.face_number(270.0, 0.0), 4);
        assert_eq!(kernel.face_number(123.0, -89.0), 5);
    }

    #[test]
    fn test_morton_roundtrip() {
        for &(i, j) in &[(0u64, 0u64), (1, 0), (0, 1), (12345, 54321), (u32::MAX as u64, 17)] {
            let m = morton(i, j);
            assert_eq!(compact_bits(m), i);
            assert_eq!(compact_bits(m >> 1), j);
        }
    }

    #[test]
    fn test_pixel_roundtrip_all_ipix() {
        let kernel = CubeKernel::new(8).unwrap();
        let nbins = 6 * 64;
        for ipix in 0..nbins {
            let (ra, dec) = kernel.ipix2ang(ipix);
            assert_eq!(kernel.ang2ipix(ra, dec), ipix, "ipix {ipix} at ({ra},{dec})");
        }
    }

    #[test]
    fn test_ipix_in_range() {
        let kernel = CubeKernel::new(1 << 10).unwrap();
        let nbins = 6 * (1u64 << 20);
        for &(ra, dec) in &[
            (0.0, 0.0),
            (359.999, 89.999),
            (180.0, -45.0),
            (45.0, 45.0),
            (222.2, -67.8),
        ] {
            assert!(kernel.ang2ipix(ra, dec) < nbins);
        }
    }

    #[test]
    fn test_ipix2xy_lower_left_corner() {
        let kernel = CubeKernel::new(4).unwrap();
        let pos = kernel.ang2ipix_xy(0.0, 0.0);
        let (face, x, y) = kernel.ipix2xy(pos.ipix);
        assert_eq!(face, pos.face);
        // The continuous coordinate lies within the cell starting at (x,y).
        let step = 2.0 / 4.0;
        assert!(pos.x >= x && pos.x < x + step);
        assert!(pos.y >= y && pos.y < y + step);
    }

    #[test]
    fn test_sindist_known_values() {
        assert!(sindist(10.0, 20.0, 10.0, 20.0).abs() < 1e-15);
        // 90 degrees apart along the equator: sin²(45°) = 0.5.
        assert!((sindist(0.0, 0.0, 90.0, 0.0) - 0.5).abs() < 1e-12);
        // Pole to pole: sin²(90°) = 1.
        assert!((sindist(0.0, -90.0, 0.0, 90.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_angular_separation() {
        assert!((angular_separation(0.0, 0.0, 90.0, 0.0) - 90.0).abs() < 1e-9);
        assert!((angular_separation(0.0, 0.0, 0.0, 1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_ang() {
        assert_eq!(normalize_ang(370.0, 10.0), (10.0, 10.0));
        assert_eq!(normalize_ang(-10.0, 0.0), (350.0, 0.0));

        let (ra, dec) = normalize_ang(0.0, 100.0);
        assert_eq!(dec, 80.0);
        assert_eq!(ra, 180.0);

        let (ra, dec) = normalize_ang(90.0, -95.0);
        assert_eq!(dec, -85.0);
        assert_eq!(ra, 270.0);

        assert_eq!(normalize_ang(0.0, 90.0), (0.0, 90.0));
        assert_eq!(normalize_ang(0.0, -90.0), (0.0, -90.0));
    }

    #[test]
    fn test_xy2ang_face_centers() {
        let kernel = CubeKernel::new(16).unwrap();
        let (ra, dec) = kernel.xy2ang(1, 0.0, 0.0);
        assert!(ra.abs() < 1e-9 || (ra - 360.0).abs() < 1e-9);
        assert!(dec.abs() < 1e-9);

        let (_, dec) = kernel.xy2ang(0, 0.0, 0.0);
        assert!((dec - 90.0).abs() < 1e-9);

        let (ra, dec) = kernel.xy2ang(3, 0.0, 0.0);
        assert!((ra - 180.0).abs() < 1e-9);
        assert!(dec.abs() < 1e-9);
    }
}
