//! specpick-io: cube loading and spectrum output for specpick.
//!
//! FITS cubes are read with cfitsio through the `fitsio` bindings; HDF5
//! input is available behind the `hdf5` feature.

mod error;
pub mod fits;
#[cfg(feature = "hdf5")]
pub mod hdf5;
mod loader;
mod mask_file;
mod writer;

pub use error::{Error, Result};
pub use fits::{FitsHeader, FitsReader};
pub use loader::{load_cube, load_fits_cube, CubeFormat, CubeLoadOptions};
pub use mask_file::{load_mask, save_mask};
pub use writer::{write_spectrum, SpectrumWriter, TableFormat};
#[cfg(feature = "hdf5")]
pub use hdf5::{load_hdf5_cube, AttributeHeader};
