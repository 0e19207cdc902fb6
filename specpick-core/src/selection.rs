//! Spaxel selection mask.

use std::ops::Range;

use ndarray::{s, Array2, ArrayView2};

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Boolean mask over the spatial plane; `true` marks an included spaxel.
///
/// The shape is fixed at construction. Coordinates are `(y, x)`, 0-based,
/// with `y` running along the second cube axis.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "MaskRecord", into = "MaskRecord"))]
pub struct SelectionMask {
    mask: Array2<bool>,
}

impl SelectionMask {
    /// Empty selection of the given spatial shape.
    #[must_use]
    pub fn new(ny: usize, nx: usize) -> Self {
        Self {
            mask: Array2::from_elem((ny, nx), false),
        }
    }

    /// Wraps an existing boolean array.
    #[must_use]
    pub fn from_array(mask: Array2<bool>) -> Self {
        Self { mask }
    }

    /// Selection of shape `(ny, nx)` with the listed `(y, x)` pixels set.
    ///
    /// # Errors
    /// Returns an error if any pixel lies outside the shape.
    pub fn from_pixels<I>(shape: (usize, usize), pixels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut selection = Self::new(shape.0, shape.1);
        for (y, x) in pixels {
            selection.set(y, x, true)?;
        }
        Ok(selection)
    }

    /// Spatial shape as `(y, x)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.mask.dim()
    }

    fn check(&self, y: usize, x: usize) -> Result<()> {
        let (ny, nx) = self.shape();
        if y >= ny || x >= nx {
            return Err(Error::PixelOutOfBounds { y, x, ny, nx });
        }
        Ok(())
    }

    /// Flips one spaxel and returns its new state.
    ///
    /// # Errors
    /// Returns an error if `(y, x)` is outside the mask.
    pub fn toggle(&mut self, y: usize, x: usize) -> Result<bool> {
        self.check(y, x)?;
        let cell = &mut self.mask[[y, x]];
        *cell = !*cell;
        Ok(*cell)
    }

    /// Sets one spaxel.
    ///
    /// # Errors
    /// Returns an error if `(y, x)` is outside the mask.
    pub fn set(&mut self, y: usize, x: usize, selected: bool) -> Result<()> {
        self.check(y, x)?;
        self.mask[[y, x]] = selected;
        Ok(())
    }

    /// Sets every spaxel in the half-open box to `selected`.
    ///
    /// # Errors
    /// Returns an error if the box extends past the mask.
    pub fn set_box(&mut self, rows: Range<usize>, cols: Range<usize>, selected: bool) -> Result<()> {
        let (ny, nx) = self.shape();
        if rows.end > ny || cols.end > nx || rows.start > rows.end || cols.start > cols.end {
            return Err(Error::PixelOutOfBounds {
                y: rows.end.saturating_sub(1),
                x: cols.end.saturating_sub(1),
                ny,
                nx,
            });
        }
        self.mask.slice_mut(s![rows, cols]).fill(selected);
        Ok(())
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        self.mask.fill(false);
    }

    /// Whether `(y, x)` is selected; out-of-range pixels are not.
    #[must_use]
    pub fn is_selected(&self, y: usize, x: usize) -> bool {
        self.mask.get([y, x]).copied().unwrap_or(false)
    }

    /// Number of selected spaxels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&v| v).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.mask.iter().any(|&v| v)
    }

    /// Selected `(y, x)` pixels in row-major order.
    #[must_use]
    pub fn selected_pixels(&self) -> Vec<(usize, usize)> {
        self.mask
            .indexed_iter()
            .filter(|&(_, &v)| v)
            .map(|(idx, _)| idx)
            .collect()
    }

    #[must_use]
    pub fn as_array(&self) -> ArrayView2<'_, bool> {
        self.mask.view()
    }
}

/// Compact on-disk form: shape plus the list of selected pixels.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct MaskRecord {
    shape: [usize; 2],
    pixels: Vec<[usize; 2]>,
}

#[cfg(feature = "serde")]
impl TryFrom<MaskRecord> for SelectionMask {
    type Error = Error;

    fn try_from(record: MaskRecord) -> Result<Self> {
        Self::from_pixels(
            (record.shape[0], record.shape[1]),
            record.pixels.into_iter().map(|[y, x]| (y, x)),
        )
    }
}

#[cfg(feature = "serde")]
impl From<SelectionMask> for MaskRecord {
    fn from(mask: SelectionMask) -> Self {
        let (ny, nx) = mask.shape();
        Self {
            shape: [ny, nx],
            pixels: mask
                .selected_pixels()
                .into_iter()
                .map(|(y, x)| [y, x])
                .collect(),
        }
    }
}
