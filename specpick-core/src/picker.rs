//! Picker image derivation and display normalization.
//!
//! The picker image only guides selection; it never feeds the extraction.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use ndarray::{s, Array2, ArrayView3, Axis, Zip};

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// NaN-ignoring median along the spectral axis for every spaxel.
///
/// Spaxels without a single finite sample come out as NaN.
#[must_use]
pub fn median_image(cube: ArrayView3<'_, f64>) -> Array2<f64> {
    let (_, ny, nx) = cube.dim();
    let mut image = Array2::<f64>::from_elem((ny, nx), f64::NAN);
    Zip::indexed(&mut image).par_for_each(|(j, i), out| {
        let mut values: Vec<f64> = cube
            .slice(s![.., j, i])
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();
        if let Some(median) = median_in_place(&mut values) {
            *out = median;
        }
    });
    image
}

fn median_in_place(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some(0.5 * (values[mid - 1] + values[mid]))
    }
}

/// Percentile `q` (0–100) of the finite values, linearly interpolated.
///
/// NaN and ±inf are skipped. Returns `None` when no finite value remains.
#[must_use]
pub fn nan_percentile<'a, I>(values: I, q: f64) -> Option<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut sorted: Vec<f64> = values.into_iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_unstable_by(f64::total_cmp);
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Stretch applied after linear rescaling to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Stretch {
    Linear,
    #[default]
    Sqrt,
    /// `log(a x + 1) / log(a + 1)` with `a = 1000`.
    Log,
    /// `asinh(x / a) / asinh(1 / a)` with `a = 0.1`.
    Asinh,
}

impl Stretch {
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Stretch::Linear => x,
            Stretch::Sqrt => x.sqrt(),
            Stretch::Log => {
                const A: f64 = 1000.0;
                (A * x + 1.0).ln() / (A + 1.0).ln()
            }
            Stretch::Asinh => {
                const A: f64 = 0.1;
                (x / A).asinh() / (1.0 / A).asinh()
            }
        }
    }
}

impl std::str::FromStr for Stretch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Stretch::Linear),
            "sqrt" => Ok(Stretch::Sqrt),
            "log" => Ok(Stretch::Log),
            "asinh" => Ok(Stretch::Asinh),
            other => Err(Error::Config(format!("unknown stretch {other:?}"))),
        }
    }
}

/// Cut levels plus stretch for displaying the picker image.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayNorm {
    pub vmin: f64,
    pub vmax: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stretch: Stretch,
}

impl DisplayNorm {
    #[must_use]
    pub fn new(vmin: f64, vmax: f64, stretch: Stretch) -> Self {
        Self {
            vmin,
            vmax,
            stretch,
        }
    }

    /// Cut levels at the `lower`/`upper` percentiles of `image`.
    ///
    /// # Errors
    /// Returns an error if the image has no finite pixel.
    pub fn from_percentiles(
        image: &Array2<f64>,
        lower: f64,
        upper: f64,
        stretch: Stretch,
    ) -> Result<Self> {
        let vmin = nan_percentile(image.iter(), lower)
            .ok_or_else(|| Error::Norm("picker image has no valid pixels".to_string()))?;
        let vmax = nan_percentile(image.iter(), upper)
            .ok_or_else(|| Error::Norm("picker image has no valid pixels".to_string()))?;
        if vmax <= vmin {
            log::warn!("degenerate display range [{vmin}, {vmax}]");
        }
        Ok(Self::new(vmin, vmax, stretch))
    }

    /// 5th/95th percentile cuts with a square-root stretch.
    ///
    /// # Errors
    /// Returns an error if the image has no finite pixel.
    pub fn default_for(image: &Array2<f64>) -> Result<Self> {
        Self::from_percentiles(image, 5.0, 95.0, Stretch::Sqrt)
    }

    /// Map a data value into `[0, 1]`. NaN stays NaN.
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        let span = self.vmax - self.vmin;
        let x = if span > 0.0 {
            ((value - self.vmin) / span).clamp(0.0, 1.0)
        } else if value >= self.vmax {
            1.0
        } else {
            0.0
        };
        self.stretch.apply(x)
    }

    /// Normalize a whole image.
    #[must_use]
    pub fn apply_image(&self, image: &Array2<f64>) -> Array2<f64> {
        image.mapv(|v| self.apply(v))
    }
}

/// Sum of the finite samples along the spectral axis; an alternative picker.
#[must_use]
pub fn collapsed_image(cube: ArrayView3<'_, f64>) -> Array2<f64> {
    cube.fold_axis(Axis(0), 0.0, |acc, &v| if v.is_finite() { acc + v } else { *acc })
}
