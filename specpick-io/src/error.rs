//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// cfitsio error.
    #[error("FITS error: {0}")]
    Fits(#[from] fitsio::errors::Error),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Requested extension is not in the file.
    #[error("extension {0:?} not found")]
    MissingExtension(String),

    /// Required header keyword is absent.
    #[error("keyword {keyword} missing from extension {extension:?}")]
    MissingKeyword { keyword: String, extension: String },

    /// Valid file using a feature this reader does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Mask file (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HDF5 library error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] specpick_core::Error),
}
