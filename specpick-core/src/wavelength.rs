//! Observed- and rest-frame wavelength axes.

use ndarray::Array1;

use crate::units::WavelengthUnit;
use crate::wcs::SpectralTransform;

/// Wavelength samples tagged with their unit.
#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthAxis {
    pub values: Array1<f64>,
    pub unit: WavelengthUnit,
}

impl WavelengthAxis {
    #[must_use]
    pub fn new(values: Array1<f64>, unit: WavelengthUnit) -> Self {
        Self { values, unit }
    }

    /// Same axis expressed in `unit`.
    #[must_use]
    pub fn to_unit(&self, unit: WavelengthUnit) -> Self {
        let factor = self.unit.factor_to(unit);
        Self {
            values: self.values.mapv(|v| v * factor),
            unit,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First and last sample, if any.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        Some((*self.values.first()?, *self.values.last()?))
    }
}

/// Observed-frame and rest-frame axes for one cube.
#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthAxes {
    pub observed: WavelengthAxis,
    pub rest: WavelengthAxis,
}

/// Samples `transform` at pixels `0..n` and derives both frames.
///
/// `rest = observed / (1 + redshift)`. Neither monotonicity of the transform
/// nor the sign of `redshift` is checked here.
pub fn derive_wavelengths<T: SpectralTransform + ?Sized>(
    transform: &T,
    n: usize,
    redshift: f64,
    observed_unit: WavelengthUnit,
    rest_unit: WavelengthUnit,
) -> WavelengthAxes {
    let to_observed = WavelengthUnit::Meter.factor_to(observed_unit);
    #[allow(clippy::cast_precision_loss)]
    let observed = Array1::from_iter(
        (0..n).map(|i| transform.pixel_to_wavelength(i as f64) * to_observed),
    );

    let to_rest = observed_unit.factor_to(rest_unit);
    let rest = observed.mapv(|v| v / (1.0 + redshift) * to_rest);

    WavelengthAxes {
        observed: WavelengthAxis::new(observed, observed_unit),
        rest: WavelengthAxis::new(rest, rest_unit),
    }
}
