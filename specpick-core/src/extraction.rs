//! Spectrum extraction over a spaxel selection.
//!
//! Flux is a NaN-ignoring sum over the selected spaxels of each spectral
//! plane; uncertainties are combined in quadrature over the same spaxels,
//! assuming independent per-spaxel noise.

use ndarray::{Array1, ArrayBase, Axis, Data, Dimension, Ix3, Zip};

use crate::error::{Error, Result};

/// Sums flux and quadrature-sums errors over the spaxels selected by `mask`.
///
/// `errors` and `mask` are broadcast to the shape of `data` using numpy
/// rules, so a 2-D `(y, x)` mask (or error map) applies to every spectral
/// plane. A voxel contributes only if its mask value is `true` and its
/// product with the mask is not NaN; unselected voxels never contribute, even
/// when they hold NaN or infinity.
///
/// Returns `(flux, uncertainty)`, both of length `data.len_of(Axis(0))`. An
/// all-`false` mask yields zeros.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if `errors` or `mask` cannot be broadcast
/// to the cube shape.
pub fn extract_spectrum<S1, S2, S3, D2, D3>(
    data: &ArrayBase<S1, Ix3>,
    errors: &ArrayBase<S2, D2>,
    mask: &ArrayBase<S3, D3>,
) -> Result<(Array1<f64>, Array1<f64>)>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    S3: Data<Elem = bool>,
    D2: Dimension,
    D3: Dimension,
{
    let shape = data.raw_dim();
    let errors = errors
        .broadcast(shape.clone())
        .ok_or_else(|| Error::ShapeMismatch {
            what: "error cube",
            expected: data.shape().to_vec(),
            actual: errors.shape().to_vec(),
        })?;
    let mask = mask.broadcast(shape).ok_or_else(|| Error::ShapeMismatch {
        what: "selection mask",
        expected: data.shape().to_vec(),
        actual: mask.shape().to_vec(),
    })?;

    let n_spec = data.len_of(Axis(0));
    let mut flux = Array1::<f64>::zeros(n_spec);
    let mut variance = Array1::<f64>::zeros(n_spec);

    for (i, ((plane, err_plane), mask_plane)) in data
        .outer_iter()
        .zip(errors.outer_iter())
        .zip(mask.outer_iter())
        .enumerate()
    {
        let (f, v) = Zip::from(&plane).and(&err_plane).and(&mask_plane).fold(
            (0.0_f64, 0.0_f64),
            |(f, v), &value, &err, &selected| {
                if !selected {
                    return (f, v);
                }
                let f = if value.is_nan() { f } else { f + value };
                let v = if err.is_nan() { v } else { v + err * err };
                (f, v)
            },
        );
        flux[i] = f;
        variance[i] = v;
    }

    Ok((flux, variance.mapv_into(f64::sqrt)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array2, Array3};

    #[allow(clippy::cast_precision_loss)]
    fn ramp_cube(shape: (usize, usize, usize)) -> Array3<f64> {
        Array3::from_shape_fn(shape, |(k, j, i)| (k * 100 + j * 10 + i) as f64)
    }

    #[test]
    fn test_single_channel_sum() {
        let data = ramp_cube((1, 2, 2));
        let errors = Array3::from_elem((1, 2, 2), 3.0);
        let mask = Array2::from_elem((2, 2), true);

        let (flux, err) = extract_spectrum(&data, &errors, &mask).unwrap();
        assert_relative_eq!(flux[0], 0.0 + 1.0 + 10.0 + 11.0);
        assert_relative_eq!(err[0], 6.0, max_relative = 1e-12);
    }

    #[test]
    fn test_unselected_nan_and_inf_ignored() {
        let mut data = ramp_cube((2, 2, 2));
        data[[0, 1, 1]] = f64::NAN;
        data[[1, 1, 1]] = f64::INFINITY;
        let mut errors = Array3::from_elem((2, 2, 2), 1.0);
        errors[[0, 1, 1]] = f64::INFINITY;

        let mut mask = Array2::from_elem((2, 2), true);
        mask[[1, 1]] = false;

        let (flux, err) = extract_spectrum(&data, &errors, &mask).unwrap();
        assert_relative_eq!(flux[0], 0.0 + 1.0 + 10.0);
        assert_relative_eq!(flux[1], 100.0 + 101.0 + 110.0);
        assert_relative_eq!(err[0], 3.0_f64.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn test_selected_infinity_propagates() {
        let mut data = ramp_cube((1, 1, 2));
        data[[0, 0, 1]] = f64::INFINITY;
        let errors = Array3::from_elem((1, 1, 2), 1.0);
        let mask = Array2::from_elem((1, 2), true);

        let (flux, _) = extract_spectrum(&data, &errors, &mask).unwrap();
        assert!(flux[0].is_infinite());
    }

    #[test]
    fn test_two_dimensional_error_map_broadcasts() {
        let data = ramp_cube((3, 2, 2));
        let error_map = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 2.0, 4.0]).unwrap();
        let mask = Array2::from_elem((2, 2), true);

        let (_, err) = extract_spectrum(&data, &error_map, &mask).unwrap();
        for value in &err {
            assert_relative_eq!(*value, 5.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let data = ramp_cube((3, 4, 5));
        let errors = Array3::<f64>::zeros((3, 4, 5));
        let mask = Array2::from_elem((5, 4), true);
        let result = extract_spectrum(&data, &errors, &mask);
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));

        let bad_errors = Array3::<f64>::zeros((2, 4, 5));
        let mask = Array2::from_elem((4, 5), true);
        assert!(extract_spectrum(&data, &bad_errors, &mask).is_err());
    }

    #[test]
    fn test_row_mask_broadcasts() {
        let data = ramp_cube((1, 3, 2));
        let errors = Array3::from_elem((1, 3, 2), 1.0);
        // (1, x) selects column 1 on every row.
        let mask = Array2::from_shape_vec((1, 2), vec![false, true]).unwrap();
        let (flux, err) = extract_spectrum(&data, &errors, &mask).unwrap();
        assert_relative_eq!(flux[0], 1.0 + 11.0 + 21.0);
        assert_relative_eq!(err[0], 3.0_f64.sqrt(), max_relative = 1e-12);
    }
}
