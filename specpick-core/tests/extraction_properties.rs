#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]
use approx::assert_relative_eq;
use ndarray::{Array2, Array3, ShapeBuilder};
use specpick_core::{
    collapsed_image, derive_wavelengths, extract_spectrum, SelectionMask, WavelengthUnit,
};

/// Deterministic test cube with values in [-5, 15).
fn generate_cube(shape: (usize, usize, usize), seed: u64) -> Array3<f64> {
    let mut state = seed;
    Array3::from_shape_simple_fn(shape, || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((state >> 11) as f64 / (1u64 << 53) as f64) * 20.0 - 5.0
    })
}

fn shapes() -> Vec<(usize, usize, usize)> {
    vec![(1, 1, 1), (5, 3, 4), (17, 8, 6), (40, 2, 9)]
}

#[test]
fn test_all_false_mask_gives_zeros() {
    for (seed, shape) in shapes().into_iter().enumerate() {
        let data = generate_cube(shape, seed as u64);
        let errors = generate_cube(shape, seed as u64 + 100).mapv(f64::abs);
        let mask = Array2::from_elem((shape.1, shape.2), false);

        let (flux, err) = extract_spectrum(&data, &errors, &mask).unwrap();
        assert_eq!(flux.len(), shape.0);
        assert_eq!(err.len(), shape.0);
        assert!(flux.iter().all(|&v| v == 0.0), "flux not zero for {:?}", shape);
        assert!(err.iter().all(|&v| v == 0.0), "errors not zero for {:?}", shape);
    }
}

#[test]
fn test_all_true_mask_gives_full_sums() {
    for (seed, shape) in shapes().into_iter().enumerate() {
        let data = generate_cube(shape, seed as u64);
        let errors = generate_cube(shape, seed as u64 + 7).mapv(f64::abs);
        let mask = Array2::from_elem((shape.1, shape.2), true);

        let (flux, err) = extract_spectrum(&data, &errors, &mask).unwrap();
        for k in 0..shape.0 {
            let plane = data.index_axis(ndarray::Axis(0), k);
            let err_plane = errors.index_axis(ndarray::Axis(0), k);
            assert_relative_eq!(flux[k], plane.sum(), epsilon = 1e-9);
            let quad = err_plane.mapv(|e| e * e).sum().sqrt();
            assert_relative_eq!(err[k], quad, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_single_pixel_mask_returns_spaxel() {
    let shape = (12, 5, 7);
    let data = generate_cube(shape, 3);
    // Negative errors come back as their absolute value.
    let errors = generate_cube(shape, 4);
    let mask = SelectionMask::from_pixels((5, 7), [(3, 2)]).unwrap();

    let (flux, err) = extract_spectrum(&data, &errors, &mask.as_array()).unwrap();
    for k in 0..shape.0 {
        assert_eq!(flux[k], data[[k, 3, 2]]);
        assert_relative_eq!(err[k], errors[[k, 3, 2]].abs(), max_relative = 1e-15);
    }
}

#[test]
fn test_invalid_value_in_one_spaxel() {
    let shape = (6, 4, 4);
    let mut data = generate_cube(shape, 11);
    let errors = generate_cube(shape, 12).mapv(f64::abs);
    data[[2, 1, 1]] = f64::NAN;

    let pixels = [(1, 1), (1, 2), (3, 0)];
    let mask = SelectionMask::from_pixels((4, 4), pixels).unwrap();
    let (flux, _) = extract_spectrum(&data, &errors, &mask.as_array()).unwrap();

    assert!(!flux[2].is_nan());
    assert_relative_eq!(flux[2], data[[2, 1, 2]] + data[[2, 3, 0]], epsilon = 1e-12);
    // Other channels still include the spaxel.
    assert_relative_eq!(
        flux[3],
        data[[3, 1, 1]] + data[[3, 1, 2]] + data[[3, 3, 0]],
        epsilon = 1e-12
    );
}

#[test]
fn test_mask_layout_invariance() {
    let shape = (9, 6, 5);
    let data = generate_cube(shape, 21);
    let errors = generate_cube(shape, 22).mapv(f64::abs);

    let selected = |j: usize, i: usize| (j * 5 + i) % 3 == 0;
    let c_order = Array2::from_shape_fn((6, 5), |(j, i)| selected(j, i));
    let f_order = Array2::from_shape_fn((6, 5).f(), |(j, i)| selected(j, i));
    let transposed = Array2::from_shape_fn((5, 6), |(i, j)| selected(j, i));

    let reference = extract_spectrum(&data, &errors, &c_order).unwrap();
    for (name, result) in [
        ("fortran", extract_spectrum(&data, &errors, &f_order).unwrap()),
        ("view", extract_spectrum(&data, &errors, &transposed.t()).unwrap()),
    ] {
        for k in 0..shape.0 {
            assert_relative_eq!(result.0[k], reference.0[k], epsilon = 1e-12);
            assert_relative_eq!(result.1[k], reference.1[k], epsilon = 1e-12);
        }
        assert_eq!(result.0.len(), reference.0.len(), "{} length differs", name);
    }
}

#[test]
fn test_linear_wavelength_round_trip() {
    let lambda0 = 0.6e-6;
    let dlambda = 1.25e-9;
    let transform = move |p: f64| lambda0 + p * dlambda;
    for redshift in [0.0, 0.5, 2.3] {
        let axes = derive_wavelengths(
            &transform,
            64,
            redshift,
            WavelengthUnit::Nanometer,
            WavelengthUnit::Nanometer,
        );
        let observed = &axes.observed.values;
        for pair in observed.windows(2) {
            assert!(pair[1] > pair[0]);
            assert_relative_eq!(pair[1] - pair[0], 1.25, max_relative = 1e-9);
        }
        for (obs, rest) in observed.iter().zip(axes.rest.values.iter()) {
            assert_relative_eq!(*rest, obs / (1.0 + redshift), max_relative = 1e-12);
        }
    }
}

#[test]
fn test_zero_redshift_rest_equals_observed() {
    let transform = |p: f64| 1.0e-6 * (1.0 + 0.01 * p);
    let axes = derive_wavelengths(
        &transform,
        30,
        0.0,
        WavelengthUnit::Micron,
        WavelengthUnit::Angstrom,
    );
    let rest = axes.rest.to_unit(WavelengthUnit::Micron);
    for (obs, rest) in axes.observed.values.iter().zip(rest.values.iter()) {
        assert_relative_eq!(obs, rest, max_relative = 1e-12);
    }
}

#[test]
fn test_full_mask_total_matches_collapsed_image() {
    for (seed, shape) in shapes().into_iter().enumerate() {
        let data = generate_cube(shape, seed as u64 + 50);
        let errors = Array3::<f64>::ones(shape);
        let mask = Array2::from_elem((shape.1, shape.2), true);

        let (flux, _) = extract_spectrum(&data, &errors, &mask).unwrap();
        let collapsed = collapsed_image(data.view());
        assert_relative_eq!(flux.sum(), collapsed.sum(), epsilon = 1e-9, max_relative = 1e-9);
    }
}
