//! Error types for cubesky.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CubeskyError>;

/// All failure modes surfaced by the public API.
///
/// Every validation failure is raised synchronously at the call that violates
/// the contract; nothing is retried internally.
#[derive(Error, Debug)]
pub enum CubeskyError {
    /// Invalid or missing construction parameter (bad bin level, bad config).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A coordinate, pixel id, face number, or face coordinate outside its
    /// documented range.
    #[error("value out of domain: {0}")]
    Domain(String),

    /// A combination of caller-supplied parameters that is incomplete or
    /// mutually exclusive.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The geometry kernel could not construct its parameter structure.
    /// Fatal; not retried.
    #[error("geometry kernel initialization failed: {0}")]
    KernelInit(String),

    /// A storage path exists but its contents cannot be read back as a valid
    /// point log. Distinct from failing to create new storage, which is `Io`.
    #[error("cannot open storage at {path:?}: {reason}")]
    StorageOpen { path: PathBuf, reason: String },

    /// A recognized but deliberately unimplemented case, e.g. appending to a
    /// read-only columnar source.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record encoding/decoding failure in the persistence layer.
    #[error("serialization error: {0}")]
    Serialization(String),
}
