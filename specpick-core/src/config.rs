//! Session configuration.

use crate::picker::DisplayNorm;
use crate::units::{FluxUnit, WavelengthUnit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::path::Path;

/// Options resolved once when a session starts.
///
/// The picker image itself is passed to the session separately, since it is
/// array data rather than configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractorConfig {
    /// Extension holding the flux cube (default: `SCI`).
    pub sci_extension: String,
    /// Extension holding the error cube (default: `ERR`).
    pub err_extension: String,
    /// Colormap name for the picker image (default: `gist_gray`).
    pub colormap: String,
    /// Source redshift, used for the rest-frame axis (default: 0).
    pub redshift: f64,
    /// Display normalization; `None` uses 5th/95th percentile cuts with a
    /// square-root stretch.
    pub norm: Option<DisplayNorm>,
    /// Label spaxels with sky coordinates instead of pixel indices.
    pub celestial_coordinates: bool,
    /// Render a quicklook plot after each extraction.
    pub plot_output: bool,
    /// Unit of the observed-frame column (default: micron).
    pub observed_unit: WavelengthUnit,
    /// Unit of the rest-frame column (default: Angstrom).
    pub rest_unit: WavelengthUnit,
    /// Flux unit of the exported table; `None` keeps the cube's unit.
    pub flux_unit: Option<FluxUnit>,
    /// Default table path (default: `output.ecsv`).
    pub output_path: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            sci_extension: "SCI".to_string(),
            err_extension: "ERR".to_string(),
            colormap: "gist_gray".to_string(),
            redshift: 0.0,
            norm: None,
            celestial_coordinates: false,
            plot_output: false,
            observed_unit: WavelengthUnit::Micron,
            rest_unit: WavelengthUnit::Angstrom,
            flux_unit: None,
            output_path: "output.ecsv".to_string(),
        }
    }
}

impl ExtractorConfig {
    /// Set the flux and error extension names.
    #[must_use]
    pub fn with_extensions(mut self, sci: impl Into<String>, err: impl Into<String>) -> Self {
        self.sci_extension = sci.into();
        self.err_extension = err.into();
        self
    }

    /// Set the source redshift.
    #[must_use]
    pub fn with_redshift(mut self, redshift: f64) -> Self {
        self.redshift = redshift;
        self
    }

    /// Set the picker colormap.
    #[must_use]
    pub fn with_colormap(mut self, colormap: impl Into<String>) -> Self {
        self.colormap = colormap.into();
        self
    }

    /// Set an explicit display normalization.
    #[must_use]
    pub fn with_norm(mut self, norm: DisplayNorm) -> Self {
        self.norm = Some(norm);
        self
    }

    /// Enable or disable sky-coordinate labels.
    #[must_use]
    pub fn with_celestial_coordinates(mut self, enabled: bool) -> Self {
        self.celestial_coordinates = enabled;
        self
    }

    /// Enable or disable the quicklook plot.
    #[must_use]
    pub fn with_plot_output(mut self, enabled: bool) -> Self {
        self.plot_output = enabled;
        self
    }

    /// Set the wavelength units of the observed and rest columns.
    #[must_use]
    pub fn with_wavelength_units(mut self, observed: WavelengthUnit, rest: WavelengthUnit) -> Self {
        self.observed_unit = observed;
        self.rest_unit = rest;
        self
    }

    /// Convert exported flux columns to `unit`.
    #[must_use]
    pub fn with_flux_unit(mut self, unit: FluxUnit) -> Self {
        self.flux_unit = Some(unit);
        self
    }

    /// Set the default output path.
    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Load configuration from a JSON file; missing fields keep defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    #[cfg(feature = "serde")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse configuration from a JSON string; missing fields keep defaults.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
