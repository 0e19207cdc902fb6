//! Cube loading: FITS (and optionally HDF5) files into [`SpectralCube`].

use crate::fits::FitsReader;
use crate::{Error, Result};
use ndarray::{Array3, ArrayD, Ix2, Ix3};
use specpick_core::{
    CelestialWcs, ExtractorConfig, FluxUnit, HeaderLookup, SpectralCube, SpectralWcs,
};
use std::path::Path;

/// Options controlling which extensions are read and how flux is scaled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CubeLoadOptions {
    /// Flux extension name (default: `SCI`).
    pub sci_extension: String,
    /// Error extension name (default: `ERR`).
    pub err_extension: String,
    /// Multiply flux and errors by `PIXAR_SR` (default: true).
    pub scale_by_pixel_area: bool,
}

impl Default for CubeLoadOptions {
    fn default() -> Self {
        Self {
            sci_extension: "SCI".to_string(),
            err_extension: "ERR".to_string(),
            scale_by_pixel_area: true,
        }
    }
}

impl From<&ExtractorConfig> for CubeLoadOptions {
    fn from(config: &ExtractorConfig) -> Self {
        Self {
            sci_extension: config.sci_extension.clone(),
            err_extension: config.err_extension.clone(),
            scale_by_pixel_area: true,
        }
    }
}

/// Container formats recognised by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeFormat {
    Fits,
    Hdf5,
}

impl CubeFormat {
    /// Guesses the format from the path; anything unrecognised is FITS.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("h5" | "hdf5" | "nxs") => CubeFormat::Hdf5,
            _ => CubeFormat::Fits,
        }
    }
}

/// Loads a cube, choosing the reader by file extension.
///
/// # Errors
/// Returns an error if the file cannot be read, an extension or required
/// keyword is missing, or the arrays have incompatible shapes.
pub fn load_cube<P: AsRef<Path>>(path: P, options: &CubeLoadOptions) -> Result<SpectralCube> {
    let path = path.as_ref();
    match CubeFormat::from_path(path) {
        CubeFormat::Fits => load_fits_cube(path, options),
        #[cfg(feature = "hdf5")]
        CubeFormat::Hdf5 => crate::hdf5::load_hdf5_cube(path, options),
        #[cfg(not(feature = "hdf5"))]
        CubeFormat::Hdf5 => Err(Error::Unsupported(format!(
            "{}: HDF5 support not compiled in (enable the `hdf5` feature)",
            path.display()
        ))),
    }
}

/// Loads the flux and error cubes from a FITS file.
///
/// # Errors
/// See [`load_cube`].
pub fn load_fits_cube<P: AsRef<Path>>(path: P, options: &CubeLoadOptions) -> Result<SpectralCube> {
    let path = path.as_ref();
    let fits = FitsReader::open(path)?;

    let sci = fits.hdu(&options.sci_extension)?;
    let err = fits.hdu(&options.err_extension)?;
    let data = into_cube(fits.read_image(&sci)?, &options.sci_extension)?;
    let errors = fits.read_image(&err)?;

    let header = fits.header(sci);
    let primary = fits.header(fits.primary()?);
    let pixel_area = if options.scale_by_pixel_area {
        Some(
            header
                .real("PIXAR_SR")
                .or_else(|| primary.real("PIXAR_SR"))
                .ok_or_else(|| Error::MissingKeyword {
                    keyword: "PIXAR_SR".to_string(),
                    extension: options.sci_extension.clone(),
                })?,
        )
    } else {
        None
    };

    let cube = assemble_cube(data, errors, &header, &options.err_extension, pixel_area)?;
    log::info!(
        "loaded {} ({} x {} x {}, {})",
        path.display(),
        cube.shape().0,
        cube.shape().1,
        cube.shape().2,
        cube.flux_unit()
    );
    Ok(cube)
}

/// Builds a cube from decoded arrays and the science header.
///
/// Shared by the FITS and HDF5 readers.
pub(crate) fn assemble_cube<H: HeaderLookup + ?Sized>(
    data: Array3<f64>,
    errors: ArrayD<f64>,
    header: &H,
    err_name: &str,
    pixel_area: Option<f64>,
) -> Result<SpectralCube> {
    let errors = broadcast_errors(errors, &data, err_name)?;

    let flux_unit = match header.text("BUNIT") {
        Some(unit) => unit.parse().unwrap_or_else(|_| {
            log::warn!("unrecognised BUNIT {unit:?}, assuming MJy/sr");
            FluxUnit::MegaJanskyPerSteradian
        }),
        None => FluxUnit::MegaJanskyPerSteradian,
    };

    let spectral = SpectralWcs::from_header(header, 3)?;
    let celestial = CelestialWcs::from_header(header).unwrap_or_else(|e| {
        log::warn!("ignoring celestial WCS: {e}");
        None
    });

    let mut cube = SpectralCube::new(data, errors, flux_unit, spectral)?.with_celestial_wcs(celestial);
    if let Some(area) = pixel_area {
        cube = cube.scaled_by_pixel_area(area);
    }
    Ok(cube)
}

fn into_cube(image: ArrayD<f64>, name: &str) -> Result<Array3<f64>> {
    let ndim = image.ndim();
    image.into_dimensionality::<Ix3>().map_err(|_| {
        Error::InvalidFormat(format!("extension {name} has {ndim} axes, expected 3"))
    })
}

/// Accepts a 3-D error cube or a 2-D spatial map broadcast over wavelength.
fn broadcast_errors(errors: ArrayD<f64>, data: &Array3<f64>, name: &str) -> Result<Array3<f64>> {
    let mismatch = |actual: &[usize]| {
        Error::CoreError(specpick_core::Error::ShapeMismatch {
            what: "error extension",
            expected: data.shape().to_vec(),
            actual: actual.to_vec(),
        })
    };
    match errors.ndim() {
        3 => {
            let cube = into_cube(errors, name)?;
            if cube.dim() == data.dim() {
                Ok(cube)
            } else {
                Err(mismatch(cube.shape()))
            }
        }
        2 => {
            let shape = errors.shape().to_vec();
            let map = errors
                .into_dimensionality::<Ix2>()
                .map_err(|_| mismatch(&shape))?;
            let view = map.broadcast(data.raw_dim()).ok_or_else(|| mismatch(&shape))?;
            Ok(view.to_owned())
        }
        _ => Err(mismatch(errors.shape())),
    }
}
