//! Extracted 1-D spectrum table.

use ndarray::Array1;

use crate::error::{Error, Result};
use crate::units::FluxUnit;
use crate::wavelength::{WavelengthAxes, WavelengthAxis};

/// Column names of the exported table, in order.
pub const COLUMN_NAMES: [&str; 4] = ["obswave", "restwave", "fnu", "dfnu"];

/// Observed and rest wavelengths with summed flux and its uncertainty.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub observed: WavelengthAxis,
    pub rest: WavelengthAxis,
    pub flux: Array1<f64>,
    pub flux_err: Array1<f64>,
    pub flux_unit: FluxUnit,
}

/// One table row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumRow {
    pub obswave: f64,
    pub restwave: f64,
    pub fnu: f64,
    pub dfnu: f64,
}

impl Spectrum {
    /// Assembles a spectrum, checking that all four columns have equal length.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] on a length mismatch.
    pub fn new(
        axes: WavelengthAxes,
        flux: Array1<f64>,
        flux_err: Array1<f64>,
        flux_unit: FluxUnit,
    ) -> Result<Self> {
        let n = axes.observed.len();
        for (what, len) in [
            ("rest wavelength", axes.rest.len()),
            ("flux", flux.len()),
            ("flux uncertainty", flux_err.len()),
        ] {
            if len != n {
                return Err(Error::ShapeMismatch {
                    what,
                    expected: vec![n],
                    actual: vec![len],
                });
            }
        }
        Ok(Self {
            observed: axes.observed,
            rest: axes.rest,
            flux,
            flux_err,
            flux_unit,
        })
    }

    /// All-zero flux and uncertainty on the given axes.
    #[must_use]
    pub fn zeros(axes: WavelengthAxes, flux_unit: FluxUnit) -> Self {
        let n = axes.observed.len();
        Self {
            observed: axes.observed,
            rest: axes.rest,
            flux: Array1::zeros(n),
            flux_err: Array1::zeros(n),
            flux_unit,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.flux.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    /// Same spectrum with flux columns expressed in `unit`.
    ///
    /// # Errors
    /// Returns an error if the units are not convertible.
    pub fn to_flux_unit(&self, unit: FluxUnit) -> Result<Self> {
        let factor = self.flux_unit.factor_to(unit)?;
        Ok(Self {
            observed: self.observed.clone(),
            rest: self.rest.clone(),
            flux: self.flux.mapv(|v| v * factor),
            flux_err: self.flux_err.mapv(|v| v * factor),
            flux_unit: unit,
        })
    }

    /// Rows in spectral order.
    pub fn rows(&self) -> impl Iterator<Item = SpectrumRow> + '_ {
        self.observed
            .values
            .iter()
            .zip(self.rest.values.iter())
            .zip(self.flux.iter().zip(self.flux_err.iter()))
            .map(|((&obswave, &restwave), (&fnu, &dfnu))| SpectrumRow {
                obswave,
                restwave,
                fnu,
                dfnu,
            })
    }
}
