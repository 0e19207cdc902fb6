//! Flux and uncertainty cubes.

use ndarray::{Array3, ArrayView3, Axis};

use crate::error::{Error, Result};
use crate::units::FluxUnit;
use crate::wcs::{CelestialWcs, SpectralWcs};

/// A loaded integral-field cube: flux, 1-sigma errors, and axis metadata.
///
/// Arrays are ordered (spectral, y, x) and are not modified after loading.
#[derive(Debug, Clone)]
pub struct SpectralCube {
    data: Array3<f64>,
    errors: Array3<f64>,
    flux_unit: FluxUnit,
    spectral_wcs: SpectralWcs,
    celestial_wcs: Option<CelestialWcs>,
    /// Solid angle per spaxel (`PIXAR_SR`) applied at load, if any.
    pixel_area_sr: Option<f64>,
}

impl SpectralCube {
    /// Creates a cube from flux and error arrays of identical shape.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the two arrays differ in shape.
    pub fn new(
        data: Array3<f64>,
        errors: Array3<f64>,
        flux_unit: FluxUnit,
        spectral_wcs: SpectralWcs,
    ) -> Result<Self> {
        if data.shape() != errors.shape() {
            return Err(Error::ShapeMismatch {
                what: "error cube",
                expected: data.shape().to_vec(),
                actual: errors.shape().to_vec(),
            });
        }
        Ok(Self {
            data,
            errors,
            flux_unit,
            spectral_wcs,
            celestial_wcs: None,
            pixel_area_sr: None,
        })
    }

    /// Attaches a celestial transform for labeling spaxels.
    #[must_use]
    pub fn with_celestial_wcs(mut self, wcs: Option<CelestialWcs>) -> Self {
        self.celestial_wcs = wcs;
        self
    }

    /// Multiplies flux and errors by the solid angle per spaxel.
    ///
    /// Surface brightness in `MJy/sr` becomes flux density in `MJy`.
    #[must_use]
    pub fn scaled_by_pixel_area(mut self, pixel_area_sr: f64) -> Self {
        self.data.mapv_inplace(|v| v * pixel_area_sr);
        self.errors.mapv_inplace(|v| v * pixel_area_sr);
        if self.flux_unit == FluxUnit::MegaJanskyPerSteradian {
            self.flux_unit = FluxUnit::MegaJansky;
        }
        self.pixel_area_sr = Some(pixel_area_sr);
        self
    }

    /// Flux array (spectral, y, x).
    #[must_use]
    pub fn data(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// Error array (spectral, y, x).
    #[must_use]
    pub fn errors(&self) -> ArrayView3<'_, f64> {
        self.errors.view()
    }

    #[must_use]
    pub fn flux_unit(&self) -> FluxUnit {
        self.flux_unit
    }

    #[must_use]
    pub fn spectral_wcs(&self) -> &SpectralWcs {
        &self.spectral_wcs
    }

    #[must_use]
    pub fn celestial_wcs(&self) -> Option<&CelestialWcs> {
        self.celestial_wcs.as_ref()
    }

    #[must_use]
    pub fn pixel_area_sr(&self) -> Option<f64> {
        self.pixel_area_sr
    }

    /// Cube shape as (spectral, y, x).
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Number of spectral samples.
    #[must_use]
    pub fn n_spectral(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Spatial shape as (y, x).
    #[must_use]
    pub fn spatial_shape(&self) -> (usize, usize) {
        let (_, ny, nx) = self.data.dim();
        (ny, nx)
    }
}
