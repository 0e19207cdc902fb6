//! Test cube files written with fitsio.
#![allow(dead_code, clippy::cast_precision_loss)]

use fitsio::images::{ImageDescription, ImageType};
use fitsio::FitsFile;
use ndarray::{Array2, Array3};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// What to put in a test cube file.
pub struct CubeFixture {
    pub data: Array3<f64>,
    pub errors: ErrorFixture,
    pub pixar_sr: Option<f64>,
    /// Put `PIXAR_SR` in the primary header instead of `SCI`.
    pub pixar_in_primary: bool,
    pub bunit: Option<String>,
    pub err_name: String,
    pub with_celestial: bool,
}

pub enum ErrorFixture {
    Cube(Array3<f64>),
    Map(Array2<f64>),
    Absent,
}

/// A written fixture; the directory is removed on drop.
pub struct FixtureFile {
    _dir: TempDir,
    path: PathBuf,
}

impl FixtureFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CubeFixture {
    pub fn new(data: Array3<f64>, errors: Array3<f64>) -> Self {
        Self {
            data,
            errors: ErrorFixture::Cube(errors),
            pixar_sr: Some(2.0),
            pixar_in_primary: false,
            bunit: Some("MJy/sr".to_string()),
            err_name: "ERR".to_string(),
            with_celestial: false,
        }
    }

    /// Writes the fixture to `cube.fits` in a fresh temporary directory.
    pub fn write(&self) -> FixtureFile {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cube.fits");
        let mut fptr = FitsFile::create(&path).open().unwrap();

        if self.pixar_in_primary {
            if let Some(area) = self.pixar_sr {
                let primary = fptr.primary_hdu().unwrap();
                primary.write_key(&mut fptr, "PIXAR_SR", area).unwrap();
            }
        }

        let (nz, ny, nx) = self.data.dim();
        let sci = fptr
            .create_image(
                "SCI".to_string(),
                &ImageDescription {
                    data_type: ImageType::Double,
                    dimensions: &[nz, ny, nx],
                },
            )
            .unwrap();
        let values: Vec<f64> = self.data.iter().copied().collect();
        sci.write_image(&mut fptr, &values).unwrap();
        sci.write_key(&mut fptr, "CTYPE3", "WAVE").unwrap();
        sci.write_key(&mut fptr, "CUNIT3", "um").unwrap();
        sci.write_key(&mut fptr, "CRPIX3", 1.0).unwrap();
        sci.write_key(&mut fptr, "CRVAL3", 5.0).unwrap();
        sci.write_key(&mut fptr, "CDELT3", 0.5).unwrap();
        if let Some(unit) = &self.bunit {
            sci.write_key(&mut fptr, "BUNIT", unit.as_str()).unwrap();
        }
        if !self.pixar_in_primary {
            if let Some(area) = self.pixar_sr {
                sci.write_key(&mut fptr, "PIXAR_SR", area).unwrap();
            }
        }
        if self.with_celestial {
            sci.write_key(&mut fptr, "CTYPE1", "RA---TAN").unwrap();
            sci.write_key(&mut fptr, "CTYPE2", "DEC--TAN").unwrap();
            sci.write_key(&mut fptr, "CRPIX1", 1.0).unwrap();
            sci.write_key(&mut fptr, "CRPIX2", 1.0).unwrap();
            sci.write_key(&mut fptr, "CRVAL1", 150.0).unwrap();
            sci.write_key(&mut fptr, "CRVAL2", 2.0).unwrap();
            sci.write_key(&mut fptr, "CDELT1", -0.0001).unwrap();
            sci.write_key(&mut fptr, "CDELT2", 0.0001).unwrap();
        }

        let err_values: Option<(Vec<usize>, Vec<f64>)> = match &self.errors {
            ErrorFixture::Cube(e) => Some((e.shape().to_vec(), e.iter().copied().collect())),
            ErrorFixture::Map(e) => Some((e.shape().to_vec(), e.iter().copied().collect())),
            ErrorFixture::Absent => None,
        };
        if let Some((shape, values)) = err_values {
            let err = fptr
                .create_image(
                    self.err_name.clone(),
                    &ImageDescription {
                        data_type: ImageType::Float,
                        dimensions: &shape,
                    },
                )
                .unwrap();
            err.write_image(&mut fptr, &values).unwrap();
        }

        drop(fptr);
        FixtureFile { _dir: dir, path }
    }
}

/// Cube whose value encodes its position: `k * 100 + y * 10 + x`.
pub fn position_cube(shape: (usize, usize, usize)) -> Array3<f64> {
    Array3::from_shape_fn(shape, |(k, y, x)| (k * 100 + y * 10 + x) as f64)
}
