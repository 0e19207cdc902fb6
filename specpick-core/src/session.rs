//! Selection session: the state behind an interactive spaxel picker.
//!
//! A display adapter translates user events into [`SpectrumSession::toggle`],
//! [`SpectrumSession::clear`] and [`SpectrumSession::commit`], and renders
//! [`SpectrumSession::current_mask`] over [`SpectrumSession::picker_image`].
//! The session is the only writer of the selection mask.
#![allow(clippy::cast_precision_loss)]

use std::ops::Range;

use ndarray::Array2;

use crate::config::ExtractorConfig;
use crate::cube::SpectralCube;
use crate::error::{Error, Result};
use crate::extraction::extract_spectrum;
use crate::picker::{median_image, DisplayNorm};
use crate::selection::SelectionMask;
use crate::spectrum::Spectrum;
use crate::wavelength::{derive_wavelengths, WavelengthAxes};

/// How a spaxel is labeled for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelLabel {
    Pixel { y: usize, x: usize },
    Sky { ra_deg: f64, dec_deg: f64 },
}

impl std::fmt::Display for PixelLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelLabel::Pixel { y, x } => write!(f, "(y={y}, x={x})"),
            PixelLabel::Sky { ra_deg, dec_deg } => {
                write!(f, "(RA={ra_deg:.6}, Dec={dec_deg:+.6})")
            }
        }
    }
}

/// A loaded cube with its picker image, selection, and latest spectrum.
#[derive(Debug)]
pub struct SpectrumSession {
    cube: SpectralCube,
    config: ExtractorConfig,
    picker_image: Array2<f64>,
    norm: Option<DisplayNorm>,
    wavelengths: WavelengthAxes,
    selection: SelectionMask,
    spectrum: Spectrum,
    commits: usize,
}

impl SpectrumSession {
    /// Resolves picker image, display norm, and wavelength axes.
    ///
    /// Without an explicit `picker_image` the NaN-ignoring median along the
    /// spectral axis is used.
    ///
    /// # Errors
    /// Returns an error if the redshift is negative or not finite, or if the
    /// picker image does not match the cube's spatial shape.
    pub fn new(
        cube: SpectralCube,
        config: ExtractorConfig,
        picker_image: Option<Array2<f64>>,
    ) -> Result<Self> {
        if !(config.redshift >= 0.0 && config.redshift.is_finite()) {
            return Err(Error::InvalidRedshift(config.redshift));
        }

        let (ny, nx) = cube.spatial_shape();
        let picker_image = match picker_image {
            Some(image) => {
                if image.dim() != (ny, nx) {
                    return Err(Error::ShapeMismatch {
                        what: "picker image",
                        expected: vec![ny, nx],
                        actual: image.shape().to_vec(),
                    });
                }
                image
            }
            None => median_image(cube.data()),
        };

        let norm = match config.norm {
            Some(norm) => Some(norm),
            None => match DisplayNorm::default_for(&picker_image) {
                Ok(norm) => Some(norm),
                Err(e) => {
                    log::warn!("no display normalization: {e}");
                    None
                }
            },
        };

        let wavelengths = derive_wavelengths(
            cube.spectral_wcs(),
            cube.n_spectral(),
            config.redshift,
            config.observed_unit,
            config.rest_unit,
        );
        let spectrum = Spectrum::zeros(wavelengths.clone(), cube.flux_unit());

        log::info!(
            "session ready: cube {:?}, redshift {}",
            cube.shape(),
            config.redshift
        );

        Ok(Self {
            cube,
            config,
            picker_image,
            norm,
            wavelengths,
            selection: SelectionMask::new(ny, nx),
            spectrum,
            commits: 0,
        })
    }

    /// Flip one spaxel; returns its new state.
    ///
    /// # Errors
    /// Returns an error if `(y, x)` is outside the spatial plane.
    pub fn toggle(&mut self, y: usize, x: usize) -> Result<bool> {
        let state = self.selection.toggle(y, x)?;
        log::debug!("toggled {} -> {state}", self.pixel_label(y, x));
        Ok(state)
    }

    /// Set one spaxel explicitly.
    ///
    /// # Errors
    /// Returns an error if `(y, x)` is outside the spatial plane.
    pub fn set(&mut self, y: usize, x: usize, selected: bool) -> Result<()> {
        self.selection.set(y, x, selected)
    }

    /// Select every spaxel in a half-open box.
    ///
    /// # Errors
    /// Returns an error if the box extends past the spatial plane.
    pub fn select_box(&mut self, rows: Range<usize>, cols: Range<usize>) -> Result<()> {
        self.selection.set_box(rows, cols, true)
    }

    /// Replace the whole selection.
    ///
    /// # Errors
    /// Returns an error if the mask shape differs from the cube's spatial shape.
    pub fn replace_selection(&mut self, mask: SelectionMask) -> Result<()> {
        if mask.shape() != self.selection.shape() {
            let (ny, nx) = self.selection.shape();
            let (my, mx) = mask.shape();
            return Err(Error::ShapeMismatch {
                what: "selection mask",
                expected: vec![ny, nx],
                actual: vec![my, mx],
            });
        }
        self.selection = mask;
        Ok(())
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.selection.clear();
    }

    #[must_use]
    pub fn current_mask(&self) -> &SelectionMask {
        &self.selection
    }

    /// Extract the spectrum of the current selection and keep it.
    ///
    /// # Errors
    /// Returns an error if extraction or flux-unit conversion fails.
    pub fn commit(&mut self) -> Result<&Spectrum> {
        let count = self.selection.count();
        if count == 0 {
            log::warn!("empty selection, spectrum is all zeros");
        }

        let (flux, flux_err) = extract_spectrum(
            &self.cube.data(),
            &self.cube.errors(),
            &self.selection.as_array(),
        )?;
        let mut spectrum = Spectrum::new(
            self.wavelengths.clone(),
            flux,
            flux_err,
            self.cube.flux_unit(),
        )?;
        if let Some(unit) = self.config.flux_unit {
            spectrum = spectrum.to_flux_unit(unit)?;
        }

        self.commits += 1;
        log::info!(
            "extracted {} channels from {count} spaxel(s)",
            spectrum.len()
        );
        self.spectrum = spectrum;
        Ok(&self.spectrum)
    }

    /// Latest extracted spectrum; zeros before the first commit.
    #[must_use]
    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    /// Number of commits so far.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    #[must_use]
    pub fn picker_image(&self) -> &Array2<f64> {
        &self.picker_image
    }

    #[must_use]
    pub fn norm(&self) -> Option<&DisplayNorm> {
        self.norm.as_ref()
    }

    #[must_use]
    pub fn wavelengths(&self) -> &WavelengthAxes {
        &self.wavelengths
    }

    #[must_use]
    pub fn cube(&self) -> &SpectralCube {
        &self.cube
    }

    #[must_use]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Label for a spaxel: sky position when enabled and available.
    #[must_use]
    pub fn pixel_label(&self, y: usize, x: usize) -> PixelLabel {
        match (self.config.celestial_coordinates, self.cube.celestial_wcs()) {
            (true, Some(wcs)) => {
                let sky = wcs.pixel_to_sky(y as f64, x as f64);
                PixelLabel::Sky {
                    ra_deg: sky.ra_deg,
                    dec_deg: sky.dec_deg,
                }
            }
            _ => PixelLabel::Pixel { y, x },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{FluxUnit, WavelengthUnit};
    use crate::wcs::{CelestialWcs, SpectralWcs};
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn cube() -> SpectralCube {
        let data = Array3::from_shape_fn((4, 3, 3), |(k, j, i)| (k + j * 3 + i) as f64);
        let errors = Array3::from_elem((4, 3, 3), 0.5);
        SpectralCube::new(
            data,
            errors,
            FluxUnit::MegaJansky,
            SpectralWcs::linear(2.0, 1.0, 0.01, WavelengthUnit::Micron),
        )
        .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let session = SpectrumSession::new(cube(), ExtractorConfig::default(), None).unwrap();
        assert!(session.current_mask().is_empty());
        assert_eq!(session.spectrum().len(), 4);
        assert!(session.spectrum().flux.iter().all(|&v| v == 0.0));
        assert_eq!(session.picker_image().dim(), (3, 3));
        assert!(session.norm().is_some());
        assert_eq!(session.commit_count(), 0);
    }

    #[test]
    fn test_toggle_commit_clear() {
        let mut session = SpectrumSession::new(cube(), ExtractorConfig::default(), None).unwrap();
        session.toggle(1, 1).unwrap();
        session.toggle(2, 0).unwrap();

        let spectrum = session.commit().unwrap().clone();
        // (1,1) -> k + 4, (2,0) -> k + 6
        for k in 0..4 {
            assert_relative_eq!(spectrum.flux[k], 2.0 * k as f64 + 10.0);
            assert_relative_eq!(spectrum.flux_err[k], 0.5 * 2.0_f64.sqrt(), max_relative = 1e-12);
        }

        session.clear();
        assert!(session.current_mask().is_empty());
        // The stored spectrum only changes on commit.
        assert_eq!(session.spectrum(), &spectrum);
        let zeros = session.commit().unwrap();
        assert!(zeros.flux.iter().all(|&v| v == 0.0));
        assert_eq!(session.commit_count(), 2);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let negative = ExtractorConfig::default().with_redshift(-0.1);
        assert!(matches!(
            SpectrumSession::new(cube(), negative, None),
            Err(Error::InvalidRedshift(_))
        ));

        let wrong_picker = Array2::zeros((3, 4));
        assert!(matches!(
            SpectrumSession::new(cube(), ExtractorConfig::default(), Some(wrong_picker)),
            Err(Error::ShapeMismatch { .. })
        ));

        let mut session = SpectrumSession::new(cube(), ExtractorConfig::default(), None).unwrap();
        assert!(session.toggle(3, 0).is_err());
        assert!(session.replace_selection(SelectionMask::new(2, 2)).is_err());
    }

    #[test]
    fn test_redshift_and_flux_unit() {
        let config = ExtractorConfig::default()
            .with_redshift(1.0)
            .with_flux_unit(FluxUnit::Jansky);
        let mut session = SpectrumSession::new(cube(), config, None).unwrap();
        let axes = session.wavelengths();
        assert_relative_eq!(axes.observed.values[0], 2.0, max_relative = 1e-12);
        assert_relative_eq!(axes.rest.values[0], 10_000.0, max_relative = 1e-12);

        session.select_box(0..1, 0..1).unwrap();
        let spectrum = session.commit().unwrap();
        assert_eq!(spectrum.flux_unit, FluxUnit::Jansky);
        assert_relative_eq!(spectrum.flux[3], 3.0e6);
    }

    #[test]
    fn test_pixel_labels() {
        let celestial = CelestialWcs {
            crpix: [2.0, 2.0],
            crval: [10.0, -30.0],
            matrix: [[-1.0e-4, 0.0], [0.0, 1.0e-4]],
        };
        let cube = cube().with_celestial_wcs(Some(celestial));

        let plain = SpectrumSession::new(cube.clone(), ExtractorConfig::default(), None).unwrap();
        assert_eq!(plain.pixel_label(1, 2), PixelLabel::Pixel { y: 1, x: 2 });

        let sky_config = ExtractorConfig::default().with_celestial_coordinates(true);
        let sky = SpectrumSession::new(cube, sky_config, None).unwrap();
        match sky.pixel_label(1, 1) {
            PixelLabel::Sky { ra_deg, dec_deg } => {
                assert_relative_eq!(ra_deg, 10.0, epsilon = 1e-9);
                assert_relative_eq!(dec_deg, -30.0, epsilon = 1e-9);
            }
            other => panic!("expected sky label, got {other:?}"),
        }
    }
}
