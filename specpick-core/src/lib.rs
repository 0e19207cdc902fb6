//! specpick-core: spaxel selection and spectrum extraction for IFU cubes.
//!
//! This crate holds the array model (flux and error cubes, wavelength axes,
//! selection masks), the extraction reduction, and the session object that a
//! display adapter drives.

pub mod config;
pub mod cube;
pub mod error;
pub mod extraction;
pub mod picker;
pub mod selection;
pub mod session;
pub mod spectrum;
pub mod units;
pub mod wavelength;
pub mod wcs;

pub use config::ExtractorConfig;
pub use cube::SpectralCube;
pub use error::{Error, Result};
pub use extraction::extract_spectrum;
pub use picker::{collapsed_image, median_image, nan_percentile, DisplayNorm, Stretch};
pub use selection::SelectionMask;
pub use session::{PixelLabel, SpectrumSession};
pub use spectrum::{Spectrum, SpectrumRow, COLUMN_NAMES};
pub use units::{FluxUnit, WavelengthUnit};
pub use wavelength::{derive_wavelengths, WavelengthAxes, WavelengthAxis};
pub use wcs::{CelestialWcs, HeaderLookup, SkyCoord, SpectralTransform, SpectralWcs};
