//! World-coordinate transforms for cube axes.
//!
//! Only the subset of FITS WCS needed for integral-field cubes is covered:
//! a linear or logarithmic wavelength axis, and a gnomonic (TAN) celestial
//! plane used for labeling spaxels.
#![allow(clippy::doc_markdown, clippy::many_single_char_names)]

use crate::error::{Error, Result};
use crate::units::WavelengthUnit;

/// Read access to header keywords, independent of the container format.
pub trait HeaderLookup {
    /// Numeric value of a keyword, if present and numeric.
    fn real(&self, key: &str) -> Option<f64>;

    /// String value of a keyword, if present.
    fn text(&self, key: &str) -> Option<String>;
}

/// Maps a 0-based spectral pixel index to a wavelength in metres.
pub trait SpectralTransform {
    fn pixel_to_wavelength(&self, pixel: f64) -> f64;
}

impl<F> SpectralTransform for F
where
    F: Fn(f64) -> f64,
{
    fn pixel_to_wavelength(&self, pixel: f64) -> f64 {
        self(pixel)
    }
}

/// Sampling of the wavelength axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralAlgorithm {
    /// `CTYPE = 'WAVE'` (or `AWAV`), uniform steps.
    Linear,
    /// `CTYPE = 'WAVE-LOG'`, uniform steps in log wavelength.
    Logarithmic,
}

/// Spectral axis description from `CRVALn`/`CRPIXn`/`CDELTn` style keywords.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralWcs {
    pub crval: f64,
    pub crpix: f64,
    /// Effective step (`CDn_n`, or `CDELTn * PCn_n`).
    pub step: f64,
    pub unit: WavelengthUnit,
    pub algorithm: SpectralAlgorithm,
}

impl SpectralWcs {
    /// Linear axis with the reference value at `crpix` (1-based, FITS convention).
    #[must_use]
    pub fn linear(crval: f64, crpix: f64, step: f64, unit: WavelengthUnit) -> Self {
        Self {
            crval,
            crpix,
            step,
            unit,
            algorithm: SpectralAlgorithm::Linear,
        }
    }

    /// Build the transform for FITS axis `axis` (1-based, usually 3).
    ///
    /// # Errors
    /// Returns an error if `CRVALn` is missing, the step is zero, the unit is
    /// unknown, or the axis type is not a wavelength.
    pub fn from_header<H: HeaderLookup + ?Sized>(header: &H, axis: usize) -> Result<Self> {
        let crval = header
            .real(&format!("CRVAL{axis}"))
            .ok_or_else(|| Error::Wcs(format!("missing CRVAL{axis}")))?;
        let crpix = header.real(&format!("CRPIX{axis}")).unwrap_or(1.0);

        let step = match header.real(&format!("CD{axis}_{axis}")) {
            Some(cd) => cd,
            None => {
                let cdelt = header.real(&format!("CDELT{axis}")).unwrap_or(1.0);
                let pc = header.real(&format!("PC{axis}_{axis}")).unwrap_or(1.0);
                cdelt * pc
            }
        };
        if step == 0.0 || !step.is_finite() {
            return Err(Error::Wcs(format!("degenerate spectral step {step} on axis {axis}")));
        }

        let unit = match header.text(&format!("CUNIT{axis}")) {
            Some(u) if !u.trim().is_empty() => u.parse()?,
            _ => WavelengthUnit::Meter,
        };

        let ctype = header.text(&format!("CTYPE{axis}")).unwrap_or_default();
        let algorithm = match ctype.trim() {
            "" | "WAVE" | "AWAV" => SpectralAlgorithm::Linear,
            "WAVE-LOG" | "AWAV-LOG" => SpectralAlgorithm::Logarithmic,
            other => {
                return Err(Error::Wcs(format!(
                    "unsupported spectral axis type {other:?} on axis {axis}"
                )))
            }
        };

        Ok(Self {
            crval,
            crpix,
            step,
            unit,
            algorithm,
        })
    }

    /// World value in the header's own unit.
    #[must_use]
    pub fn world(&self, pixel: f64) -> f64 {
        let offset = self.step * (pixel + 1.0 - self.crpix);
        match self.algorithm {
            SpectralAlgorithm::Linear => self.crval + offset,
            SpectralAlgorithm::Logarithmic => self.crval * (offset / self.crval).exp(),
        }
    }
}

impl SpectralTransform for SpectralWcs {
    fn pixel_to_wavelength(&self, pixel: f64) -> f64 {
        self.unit.convert(self.world(pixel), WavelengthUnit::Meter)
    }
}

/// Sky position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyCoord {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

/// Gnomonic (TAN) projection of the two spatial axes.
#[derive(Debug, Clone, PartialEq)]
pub struct CelestialWcs {
    /// Reference pixel (1-based) for axes 1 (x) and 2 (y).
    pub crpix: [f64; 2],
    /// Reference sky position (RA, Dec) in degrees.
    pub crval: [f64; 2],
    /// Linear transform from pixel offsets to intermediate degrees.
    pub matrix: [[f64; 2]; 2],
}

impl CelestialWcs {
    /// Build from `CTYPE1/2 = RA---TAN/DEC--TAN` headers.
    ///
    /// Returns `Ok(None)` when the header carries no celestial axes.
    ///
    /// # Errors
    /// Returns an error for celestial axes in a projection other than TAN.
    pub fn from_header<H: HeaderLookup + ?Sized>(header: &H) -> Result<Option<Self>> {
        let (Some(ctype1), Some(ctype2)) = (header.text("CTYPE1"), header.text("CTYPE2")) else {
            return Ok(None);
        };
        let (ctype1, ctype2) = (ctype1.trim().to_string(), ctype2.trim().to_string());
        if !ctype1.starts_with("RA") || !ctype2.starts_with("DEC") {
            return Ok(None);
        }
        if !ctype1.ends_with("-TAN") || !ctype2.ends_with("-TAN") {
            return Err(Error::Wcs(format!(
                "unsupported celestial projection {ctype1}/{ctype2}"
            )));
        }

        let (Some(ra0), Some(dec0)) = (header.real("CRVAL1"), header.real("CRVAL2")) else {
            return Err(Error::Wcs("missing CRVAL1/CRVAL2".to_string()));
        };
        let crpix = [
            header.real("CRPIX1").unwrap_or(1.0),
            header.real("CRPIX2").unwrap_or(1.0),
        ];

        let matrix = if let Some(cd11) = header.real("CD1_1") {
            [
                [cd11, header.real("CD1_2").unwrap_or(0.0)],
                [
                    header.real("CD2_1").unwrap_or(0.0),
                    header.real("CD2_2").unwrap_or(0.0),
                ],
            ]
        } else {
            let cdelt1 = header.real("CDELT1").unwrap_or(1.0);
            let cdelt2 = header.real("CDELT2").unwrap_or(1.0);
            [
                [
                    cdelt1 * header.real("PC1_1").unwrap_or(1.0),
                    cdelt1 * header.real("PC1_2").unwrap_or(0.0),
                ],
                [
                    cdelt2 * header.real("PC2_1").unwrap_or(0.0),
                    cdelt2 * header.real("PC2_2").unwrap_or(1.0),
                ],
            ]
        };

        Ok(Some(Self {
            crpix,
            crval: [ra0, dec0],
            matrix,
        }))
    }

    /// Sky position of the centre of spaxel `(y, x)` (0-based).
    #[must_use]
    pub fn pixel_to_sky(&self, y: f64, x: f64) -> SkyCoord {
        let dx = x + 1.0 - self.crpix[0];
        let dy = y + 1.0 - self.crpix[1];
        let xi = (self.matrix[0][0] * dx + self.matrix[0][1] * dy).to_radians();
        let eta = (self.matrix[1][0] * dx + self.matrix[1][1] * dy).to_radians();

        // Native spherical coordinates of the zenithal projection.
        let r = xi.hypot(eta);
        let phi = xi.atan2(-eta);
        let theta = if r == 0.0 {
            std::f64::consts::FRAC_PI_2
        } else {
            (1.0 / r).atan()
        };

        let ra0 = self.crval[0].to_radians();
        let dec0 = self.crval[1].to_radians();
        // LONPOLE defaults to 180 degrees for zenithal projections.
        let dphi = phi - std::f64::consts::PI;

        let a = -theta.cos() * dphi.sin();
        let b = theta.sin() * dec0.cos() - theta.cos() * dec0.sin() * dphi.cos();
        let ra = (ra0 + a.atan2(b)).to_degrees().rem_euclid(360.0);
        let dec = (theta.sin() * dec0.sin() + theta.cos() * dec0.cos() * dphi.cos())
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees();

        SkyCoord {
            ra_deg: ra,
            dec_deg: dec,
        }
    }
}
