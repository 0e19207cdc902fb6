//! FITS image access through cfitsio.
//!
//! Extensions are located by `EXTNAME`. cfitsio applies `BSCALE`/`BZERO`
//! and expands tile-compressed images; integer `BLANK` samples become NaN.

use crate::{Error, Result};
use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::images::ImageType;
use fitsio::FitsFile;
use ndarray::{ArrayD, IxDyn};
use specpick_core::HeaderLookup;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// An open FITS file.
///
/// cfitsio keeps a current-HDU cursor inside the handle, so every access
/// needs it mutably. The handle lives in a `RefCell` so that several
/// [`FitsHeader`]s can share it.
pub struct FitsReader {
    file: RefCell<FitsFile>,
    path: PathBuf,
}

impl FitsReader {
    /// Opens a FITS file for reading.
    ///
    /// # Errors
    /// Returns an error if cfitsio cannot open the file or parse its primary
    /// header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = FitsFile::open(path)?;
        log::debug!("opened {}", path.display());
        Ok(Self {
            file: RefCell::new(file),
            path: path.to_path_buf(),
        })
    }

    /// The primary HDU.
    ///
    /// # Errors
    /// Returns an error if cfitsio cannot move to the first HDU.
    pub fn primary(&self) -> Result<FitsHdu> {
        Ok(self.file.borrow_mut().primary_hdu()?)
    }

    /// Finds an extension by `EXTNAME`, ignoring case.
    ///
    /// # Errors
    /// Returns [`Error::MissingExtension`] if no HDU carries that name.
    pub fn hdu(&self, name: &str) -> Result<FitsHdu> {
        let mut file = self.file.borrow_mut();
        file.hdu(name)
            .or_else(|_| file.hdu(name.to_ascii_uppercase().as_str()))
            .map_err(|_| Error::MissingExtension(name.to_string()))
    }

    /// Keyword access for `hdu`.
    #[must_use]
    pub fn header(&self, hdu: FitsHdu) -> FitsHeader<'_> {
        FitsHeader {
            file: &self.file,
            hdu,
        }
    }

    /// Image shape with the slowest axis first, i.e. (NAXISn … NAXIS1).
    fn image_shape(&self, hdu: &FitsHdu) -> Result<Vec<usize>> {
        match &hdu.info {
            HduInfo::ImageInfo { shape, .. } => Ok(shape.clone()),
            _ => Err(Error::InvalidFormat(format!(
                "{}: HDU is not an image",
                self.path.display()
            ))),
        }
    }

    /// Reads a whole image HDU as `f64`.
    ///
    /// # Errors
    /// Returns an error if the HDU is not an image, has no data axes, declares
    /// more samples than fit in memory, or cfitsio fails to read it.
    pub fn read_image(&self, hdu: &FitsHdu) -> Result<ArrayD<f64>> {
        let shape = self.image_shape(hdu)?;
        if shape.is_empty() {
            return Err(Error::InvalidFormat(format!(
                "{}: image HDU has no data",
                self.path.display()
            )));
        }
        let count = sample_count(&shape)?;

        let mut values: Vec<f64> = hdu.read_image(&mut self.file.borrow_mut())?;
        if values.len() != count {
            return Err(Error::InvalidFormat(format!(
                "{}: expected {count} samples, read {}",
                self.path.display(),
                values.len()
            )));
        }

        if let HduInfo::ImageInfo { image_type, .. } = &hdu.info {
            if is_integer(image_type) {
                if let Some(sentinel) = blank_value(hdu, &mut self.file.borrow_mut()) {
                    values
                        .iter_mut()
                        .filter(|v| **v == sentinel)
                        .for_each(|v| *v = f64::NAN);
                }
            }
        }

        ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| Error::InvalidFormat(format!("{}: {e}", self.path.display())))
    }
}

/// Keywords of one HDU, read on demand.
pub struct FitsHeader<'f> {
    file: &'f RefCell<FitsFile>,
    hdu: FitsHdu,
}

impl HeaderLookup for FitsHeader<'_> {
    fn real(&self, key: &str) -> Option<f64> {
        self.hdu.read_key(&mut self.file.borrow_mut(), key).ok()
    }

    fn text(&self, key: &str) -> Option<String> {
        self.hdu
            .read_key::<String>(&mut self.file.borrow_mut(), key)
            .ok()
            .map(|s| s.trim().to_string())
    }
}

/// Physical value of the integer `BLANK` sentinel after scaling.
fn blank_value(hdu: &FitsHdu, file: &mut FitsFile) -> Option<f64> {
    let blank: i64 = hdu.read_key(file, "BLANK").ok()?;
    let bscale: f64 = hdu.read_key(file, "BSCALE").unwrap_or(1.0);
    let bzero: f64 = hdu.read_key(file, "BZERO").unwrap_or(0.0);
    #[allow(clippy::cast_precision_loss)]
    Some(blank as f64 * bscale + bzero)
}

fn is_integer(image_type: &ImageType) -> bool {
    !matches!(image_type, ImageType::Float | ImageType::Double)
}

/// Number of samples in an image of `shape`.
///
/// Axis lengths come straight from the header, so the product and its byte
/// size are checked before anything is allocated.
fn sample_count(shape: &[usize]) -> Result<usize> {
    let overflow = || Error::InvalidFormat(format!("data size overflow for shape {shape:?}"));
    let count = shape
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(overflow)?;
    let bytes = count
        .checked_mul(std::mem::size_of::<f64>())
        .ok_or_else(overflow)?;
    if isize::try_from(bytes).is_err() {
        return Err(overflow());
    }
    Ok(count)
}
