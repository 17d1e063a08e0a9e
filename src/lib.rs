//! # Cubesky
//!
//! Sky pixelization and radial queries on the quadrilateralized spherical
//! cube.
//!
//! The sphere is projected onto the six faces of a cube and each face is cut
//! into a `nside x nside` grid, giving every cell a single integer pixel id.
//! On top of the pixelization sits a small spatial index: points ingested as
//! (ra, dec) degrees, and cone searches answered by decomposing the query
//! disc into a bounded union of pixel-id intervals followed by an exact
//! distance refine.
//!
//! ## Quick start
//!
//! ```rust
//! use cubesky::SkyIndex;
//!
//! let mut index = SkyIndex::builder().bin_level(12).build()?;
//!
//! index.insert(279.2347, 38.7837)?; // Vega
//! index.insert(213.9153, 19.1824)?; // Arcturus
//!
//! let near_vega = index.radial_query(279.0, 38.5, 1.0)?;
//! assert_eq!(near_vega.len(), 1);
//! # Ok::<(), cubesky::CubeskyError>(())
//! ```
//!
//! ## Coordinate conversion without an index
//!
//! ```rust
//! use cubesky::Pixelization;
//!
//! let scheme = Pixelization::new(8)?;
//! let ipix = scheme.ang2ipix(83.6331, 22.0145)?;
//! let (ra, dec) = scheme.ipix2ang(ipix)?;
//! assert_eq!(scheme.ang2ipix(ra, dec)?, ipix);
//! # Ok::<(), cubesky::CubeskyError>(())
//! ```
//!
//! ## Features
//!
//! - `append-log` (default): file-backed persistent point storage.

pub mod builder;
pub mod config;
pub mod error;
pub mod index;
pub mod kernel;
pub mod scheme;
pub mod store;

pub use builder::SkyIndexBuilder;
pub use config::{Config, DEFAULT_BIN_LEVEL, DEFAULT_COMMIT_INTERVAL};
pub use error::{CubeskyError, Result};
pub use index::SkyIndex;
pub use kernel::{
    CubeKernel, DiscCover, GeometryKernel, PixelPosition, angular_separation, normalize_ang,
    sindist,
};
pub use scheme::Pixelization;
pub use store::{PointBackend, PointStore, StoreStats};

#[cfg(feature = "append-log")]
pub use store::AppendLogBackend;

// Re-export the point type used throughout the public API.
pub use geo::Point;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for working with the crate.
pub mod prelude {
    pub use crate::builder::SkyIndexBuilder;
    pub use crate::config::Config;
    pub use crate::error::{CubeskyError, Result};
    pub use crate::index::SkyIndex;
    pub use crate::kernel::{DiscCover, GeometryKernel};
    pub use crate::scheme::Pixelization;
    pub use crate::store::{PointStore, StoreStats};
    pub use geo::Point;
}
