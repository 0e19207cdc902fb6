//! Physical unit tags for wavelength and flux arrays.
//!
//! Arrays carry raw `f64` values; the unit travels alongside as a tag and is
//! only applied when converting at the boundaries (file parsing and table
//! output).

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Length units used for spectral axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WavelengthUnit {
    Meter,
    Micron,
    Nanometer,
    Angstrom,
}

impl WavelengthUnit {
    /// Size of one unit in metres.
    #[must_use]
    pub fn in_meters(self) -> f64 {
        match self {
            WavelengthUnit::Meter => 1.0,
            WavelengthUnit::Micron => 1e-6,
            WavelengthUnit::Nanometer => 1e-9,
            WavelengthUnit::Angstrom => 1e-10,
        }
    }

    /// Multiplicative factor taking a value in `self` to `target`.
    #[must_use]
    pub fn factor_to(self, target: WavelengthUnit) -> f64 {
        if self == target {
            1.0
        } else {
            self.in_meters() / target.in_meters()
        }
    }

    /// Convert a single value from `self` to `target`.
    #[must_use]
    pub fn convert(self, value: f64, target: WavelengthUnit) -> f64 {
        value * self.factor_to(target)
    }

    /// Unit string as written in ECSV headers.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            WavelengthUnit::Meter => "m",
            WavelengthUnit::Micron => "um",
            WavelengthUnit::Nanometer => "nm",
            WavelengthUnit::Angstrom => "Angstrom",
        }
    }
}

impl fmt::Display for WavelengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for WavelengthUnit {
    type Err = Error;

    /// Accepts the spellings found in FITS `CUNITn` cards.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "m" | "meter" | "metre" | "Meter" => Ok(WavelengthUnit::Meter),
            "um" | "micron" | "Micron" | "microns" | "µm" => Ok(WavelengthUnit::Micron),
            "nm" | "nanometer" | "nanometre" => Ok(WavelengthUnit::Nanometer),
            "Angstrom" | "angstrom" | "ANGSTROM" | "A" | "AA" | "Å" => {
                Ok(WavelengthUnit::Angstrom)
            }
            other => Err(Error::UnknownUnit(other.to_string())),
        }
    }
}

/// Flux density units for extracted spectra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FluxUnit {
    MegaJansky,
    Jansky,
    MilliJansky,
    MicroJansky,
    /// Surface brightness; only produced for cubes loaded without area scaling.
    MegaJanskyPerSteradian,
}

impl FluxUnit {
    fn in_jansky(self) -> Option<f64> {
        match self {
            FluxUnit::MegaJansky => Some(1e6),
            FluxUnit::Jansky => Some(1.0),
            FluxUnit::MilliJansky => Some(1e-3),
            FluxUnit::MicroJansky => Some(1e-6),
            FluxUnit::MegaJanskyPerSteradian => None,
        }
    }

    /// Multiplicative factor taking a value in `self` to `target`.
    ///
    /// # Errors
    /// Returns an error when one side is a surface brightness and the other a
    /// flux density.
    pub fn factor_to(self, target: FluxUnit) -> Result<f64> {
        if self == target {
            return Ok(1.0);
        }
        match (self.in_jansky(), target.in_jansky()) {
            (Some(a), Some(b)) => Ok(a / b),
            _ => Err(Error::IncompatibleUnits {
                from: self.to_string(),
                to: target.to_string(),
            }),
        }
    }

    /// Unit string as written in ECSV headers.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            FluxUnit::MegaJansky => "MJy",
            FluxUnit::Jansky => "Jy",
            FluxUnit::MilliJansky => "mJy",
            FluxUnit::MicroJansky => "uJy",
            FluxUnit::MegaJanskyPerSteradian => "MJy / sr",
        }
    }
}

impl fmt::Display for FluxUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for FluxUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "MJy" => Ok(FluxUnit::MegaJansky),
            "Jy" => Ok(FluxUnit::Jansky),
            "mJy" => Ok(FluxUnit::MilliJansky),
            "uJy" | "µJy" => Ok(FluxUnit::MicroJansky),
            "MJy/sr" | "MJy/steradian" => Ok(FluxUnit::MegaJanskyPerSteradian),
            _ => Err(Error::UnknownUnit(s.to_string())),
        }
    }
}
