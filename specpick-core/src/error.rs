//! Error types for specpick-core.

use thiserror::Error;

/// Result type alias for specpick operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for specpick operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Two arrays that must agree (or broadcast) in shape do not.
    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Pixel coordinate outside the spatial plane.
    #[error("pixel ({y}, {x}) outside spatial shape ({ny}, {nx})")]
    PixelOutOfBounds {
        y: usize,
        x: usize,
        ny: usize,
        nx: usize,
    },

    /// Redshift rejected at session construction.
    #[error("invalid redshift: {0}")]
    InvalidRedshift(f64),

    /// Unrecognized physical unit string.
    #[error("unknown unit: {0:?}")]
    UnknownUnit(String),

    /// Conversion between incompatible units.
    #[error("cannot convert {from} to {to}")]
    IncompatibleUnits { from: String, to: String },

    /// Unsupported or malformed world-coordinate description.
    #[error("WCS error: {0}")]
    Wcs(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Display normalization could not be derived.
    #[error("normalization error: {0}")]
    Norm(String),

    /// JSON (de)serialization error.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
