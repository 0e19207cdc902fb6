//! HDF5 cube input.
//!
//! Flux and error arrays are root-level datasets named after the extensions
//! (`SCI`, `ERR`); WCS and `PIXAR_SR` are scalar attributes on the flux
//! dataset, with file attributes as a fallback.

use crate::loader::{assemble_cube, CubeLoadOptions};
use crate::{Error, Result};
use hdf5::types::VarLenUnicode;
use hdf5::{Dataset, File, Location};
use ndarray::{ArrayD, Ix3, IxDyn};
use specpick_core::{HeaderLookup, SpectralCube};
use std::collections::HashMap;
use std::path::Path;

/// Scalar attributes of one HDF5 object, exposed as header keywords.
#[derive(Debug, Clone, Default)]
pub struct AttributeHeader {
    reals: HashMap<String, f64>,
    texts: HashMap<String, String>,
}

impl AttributeHeader {
    /// Reads every scalar numeric or string attribute of `location`.
    ///
    /// # Errors
    /// Returns an error if the attribute names cannot be listed.
    pub fn read(location: &Location) -> Result<Self> {
        let mut header = Self::default();
        for name in location.attr_names()? {
            let Ok(attr) = location.attr(&name) else {
                continue;
            };
            if let Ok(value) = attr.read_scalar::<f64>() {
                header.reals.insert(name, value);
            } else if let Ok(value) = attr.read_scalar::<VarLenUnicode>() {
                header.texts.insert(name, value.to_string());
            } else {
                log::debug!("skipping non-scalar attribute {name}");
            }
        }
        Ok(header)
    }

    /// Fills in keywords missing here from `other`.
    #[must_use]
    pub fn with_fallback(mut self, other: Self) -> Self {
        for (k, v) in other.reals {
            self.reals.entry(k).or_insert(v);
        }
        for (k, v) in other.texts {
            self.texts.entry(k).or_insert(v);
        }
        self
    }
}

impl HeaderLookup for AttributeHeader {
    fn real(&self, key: &str) -> Option<f64> {
        self.reals.get(key).copied()
    }

    fn text(&self, key: &str) -> Option<String> {
        self.texts.get(key).cloned()
    }
}

/// Loads the flux and error cubes from an HDF5 file.
///
/// # Errors
/// Returns an error if a dataset or `PIXAR_SR` is missing, or HDF5 I/O fails.
pub fn load_hdf5_cube<P: AsRef<Path>>(path: P, options: &CubeLoadOptions) -> Result<SpectralCube> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let sci = find_dataset(&file, &options.sci_extension)?;
    let err = find_dataset(&file, &options.err_extension)?;

    let header = AttributeHeader::read(&sci)?.with_fallback(AttributeHeader::read(&file)?);
    let data = read_array(&sci)?
        .into_dimensionality::<Ix3>()
        .map_err(|_| {
            Error::InvalidFormat(format!(
                "dataset {} has {} axes, expected 3",
                options.sci_extension,
                sci.ndim()
            ))
        })?;
    let errors = read_array(&err)?;

    let pixel_area = if options.scale_by_pixel_area {
        Some(
            header
                .real("PIXAR_SR")
                .ok_or_else(|| Error::MissingKeyword {
                    keyword: "PIXAR_SR".to_string(),
                    extension: options.sci_extension.clone(),
                })?,
        )
    } else {
        None
    };

    let cube = assemble_cube(data, errors, &header, &options.err_extension, pixel_area)?;
    log::info!(
        "loaded {} ({} x {} x {}, {})",
        path.display(),
        cube.shape().0,
        cube.shape().1,
        cube.shape().2,
        cube.flux_unit()
    );
    Ok(cube)
}

fn find_dataset(file: &File, name: &str) -> Result<Dataset> {
    file.dataset(name)
        .or_else(|_| file.dataset(&name.to_ascii_lowercase()))
        .map_err(|_| Error::MissingExtension(name.to_string()))
}

fn read_array(dataset: &Dataset) -> Result<ArrayD<f64>> {
    let shape = dataset.shape();
    let values = dataset.read_raw::<f64>()?;
    ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| Error::InvalidFormat(format!("dataset {}: {e}", dataset.name())))
}
