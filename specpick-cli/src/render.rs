//! PNG rendering of the picker image and of extracted spectra.

use crate::colormap::Colormap;
use crate::{CliError, Result};
use crate::util::{f64_to_pixel, u32_to_f64, usize_to_f64};
use image::{Rgba, RgbaImage};
use ndarray::Array2;
use specpick_core::{DisplayNorm, SelectionMask, Spectrum};

/// Opacity of the selection overlay.
const OVERLAY_ALPHA: f64 = 0.5;

/// Largest picker PNG side in pixels.
const MAX_PICKER_SIDE: u32 = 1 << 16;

/// Renders the picker image with row 0 at the bottom, each spaxel drawn as a
/// `scale` x `scale` block. Selected spaxels are tinted with the overlay map.
///
/// # Errors
/// Returns [`CliError::Argument`] if either output side would exceed
/// `MAX_PICKER_SIDE` pixels.
pub fn render_picker(
    image: &Array2<f64>,
    norm: Option<&DisplayNorm>,
    colormap: Colormap,
    selection: Option<&SelectionMask>,
    scale: u32,
) -> Result<RgbaImage> {
    let scale = scale.max(1);
    let (ny, nx) = image.dim();
    let side = |n: usize| {
        u32::try_from(n)
            .ok()
            .and_then(|n| n.checked_mul(scale))
            .filter(|&side| side <= MAX_PICKER_SIDE)
    };
    let (Some(width), Some(height)) = (side(nx), side(ny)) else {
        return Err(CliError::Argument(format!(
            "picker image {nx}x{ny} at scale {scale} exceeds {MAX_PICKER_SIDE} pixels per side"
        )));
    };

    let overlay = Colormap::RdBu.apply(1.0);
    let levels = norm.map(|n| n.apply_image(image));

    Ok(RgbaImage::from_fn(width, height, |px, py| {
        let x = (px / scale) as usize;
        let y = ny - 1 - (py / scale) as usize;
        let level = levels.as_ref().map_or(0.0, |l| l[[y, x]]);
        let mut rgba = colormap.apply(level);
        if selection.is_some_and(|s| s.is_selected(y, x)) {
            rgba = blend(rgba, overlay, OVERLAY_ALPHA);
        }
        Rgba(rgba)
    }))
}

fn blend(base: [u8; 4], top: [u8; 4], alpha: f64) -> [u8; 4] {
    let mix = |a: u8, b: u8| {
        crate::util::f64_to_u8(f64::from(a) * (1.0 - alpha) + f64::from(b) * alpha)
    };
    [
        mix(base[0], top[0]),
        mix(base[1], top[1]),
        mix(base[2], top[2]),
        255,
    ]
}

const PLOT_WIDTH: u32 = 800;
const PLOT_HEIGHT: u32 = 400;
const MARGIN: u32 = 20;

/// Quicklook plot of flux against observed wavelength.
///
/// The uncertainty is drawn as a grey band behind the flux curve. Non-finite
/// samples leave gaps.
#[must_use]
pub fn render_spectrum(spectrum: &Spectrum) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(PLOT_WIDTH, PLOT_HEIGHT, Rgba([255, 255, 255, 255]));
    draw_frame(&mut canvas);

    let wave = &spectrum.observed.values;
    let flux = &spectrum.flux;
    let err = &spectrum.flux_err;

    let Some((w_min, w_max)) = finite_range(wave.iter().copied()) else {
        return canvas;
    };
    let bounds = flux
        .iter()
        .zip(err.iter())
        .flat_map(|(&f, &e)| [f - e.abs(), f + e.abs(), f]);
    let Some((f_min, f_max)) = finite_range(bounds) else {
        return canvas;
    };

    let inner_w = u32_to_f64(PLOT_WIDTH - 2 * MARGIN);
    let inner_h = u32_to_f64(PLOT_HEIGHT - 2 * MARGIN);
    let w_span = if w_max > w_min { w_max - w_min } else { 1.0 };
    let f_span = if f_max > f_min { f_max - f_min } else { 1.0 };
    let to_x = |w: f64| u32_to_f64(MARGIN) + (w - w_min) / w_span * (inner_w - 1.0);
    let to_y = |f: f64| u32_to_f64(PLOT_HEIGHT - MARGIN) - 1.0 - (f - f_min) / f_span * (inner_h - 1.0);

    let band = Rgba([200, 200, 200, 255]);
    for ((&w, &f), &e) in wave.iter().zip(flux.iter()).zip(err.iter()) {
        if !(w.is_finite() && f.is_finite() && e.is_finite()) {
            continue;
        }
        let x = to_x(w);
        draw_line(&mut canvas, (x, to_y(f - e.abs())), (x, to_y(f + e.abs())), band);
    }

    let line = Rgba([0, 0, 0, 255]);
    let mut previous: Option<(f64, f64)> = None;
    for (&w, &f) in wave.iter().zip(flux.iter()) {
        if !(w.is_finite() && f.is_finite()) {
            previous = None;
            continue;
        }
        let point = (to_x(w), to_y(f));
        if let Some(start) = previous {
            draw_line(&mut canvas, start, point, line);
        } else {
            put(&mut canvas, point.0, point.1, line);
        }
        previous = Some(point);
    }

    log::debug!(
        "plotted {} samples, wavelength [{w_min}, {w_max}], flux [{f_min}, {f_max}]",
        spectrum.len()
    );
    canvas
}

fn finite_range<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn draw_frame(canvas: &mut RgbaImage) {
    let color = Rgba([0, 0, 0, 255]);
    let (left, right) = (u32_to_f64(MARGIN - 1), u32_to_f64(PLOT_WIDTH - MARGIN));
    let (top, bottom) = (u32_to_f64(MARGIN - 1), u32_to_f64(PLOT_HEIGHT - MARGIN));
    draw_line(canvas, (left, top), (right, top), color);
    draw_line(canvas, (left, bottom), (right, bottom), color);
    draw_line(canvas, (left, top), (left, bottom), color);
    draw_line(canvas, (right, top), (right, bottom), color);
}

fn put(canvas: &mut RgbaImage, x: f64, y: f64, color: Rgba<u8>) {
    if let (Some(px), Some(py)) = (
        f64_to_pixel(x, canvas.width()),
        f64_to_pixel(y, canvas.height()),
    ) {
        canvas.put_pixel(px, py, color);
    }
}

/// Draws a line by sampling it at one-pixel steps.
fn draw_line(canvas: &mut RgbaImage, from: (f64, f64), to: (f64, f64), color: Rgba<u8>) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = steps as usize;
    for i in 0..=n {
        let t = usize_to_f64(i) / steps;
        put(canvas, from.0 + dx * t + 0.5, from.1 + dy * t + 0.5, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use specpick_core::{derive_wavelengths, FluxUnit, Stretch, WavelengthUnit};

    #[test]
    fn test_picker_origin_is_lower_left() {
        let image = array![[0.0, 0.0], [1.0, 1.0]];
        let norm = DisplayNorm::new(0.0, 1.0, Stretch::Linear);
        let png = render_picker(&image, Some(&norm), Colormap::Grayscale, None, 3).unwrap();
        assert_eq!(png.dimensions(), (6, 6));
        // y = 1 is the top row of the picture.
        assert_eq!(png.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(png.get_pixel(5, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_picker_overlay_marks_selection() {
        let image = Array2::zeros((2, 2));
        let norm = DisplayNorm::new(0.0, 1.0, Stretch::Linear);
        let mask = SelectionMask::from_pixels((2, 2), [(0, 1)]).unwrap();
        let png = render_picker(&image, Some(&norm), Colormap::Grayscale, Some(&mask), 1).unwrap();
        let selected = png.get_pixel(1, 1).0;
        let unselected = png.get_pixel(0, 1).0;
        assert_eq!(unselected, [0, 0, 0, 255]);
        assert_ne!(selected, unselected);
        assert!(selected[2] > selected[0], "overlay should be blue-ish");
    }

    #[test]
    fn test_picker_rejects_oversized_scale() {
        let image = Array2::zeros((2, 2));
        assert!(matches!(
            render_picker(&image, None, Colormap::Grayscale, None, u32::MAX),
            Err(CliError::Argument(_))
        ));
        // 2 x 2^16 is representable but over the side limit.
        assert!(render_picker(&image, None, Colormap::Grayscale, None, 1 << 16).is_err());
    }

    #[test]
    fn test_render_spectrum_draws_curve() {
        let transform = |p: f64| 1.0e-6 * (1.0 + 0.1 * p);
        let axes = derive_wavelengths(
            &transform,
            5,
            0.0,
            WavelengthUnit::Micron,
            WavelengthUnit::Angstrom,
        );
        let spectrum = Spectrum::new(
            axes,
            array![1.0, 2.0, f64::NAN, 4.0, 3.0],
            array![0.1, 0.1, 0.1, 0.1, 0.1],
            FluxUnit::MegaJansky,
        )
        .unwrap();
        let png = render_spectrum(&spectrum);
        assert_eq!(png.dimensions(), (PLOT_WIDTH, PLOT_HEIGHT));

        let frame_only = render_spectrum(&Spectrum::zeros(
            derive_wavelengths(&transform, 0, 0.0, WavelengthUnit::Micron, WavelengthUnit::Micron),
            FluxUnit::MegaJansky,
        ));
        let dark = |img: &RgbaImage| img.pixels().filter(|p| p.0 == [0, 0, 0, 255]).count();
        assert!(dark(&png) > dark(&frame_only) + 100);
        assert!(png.pixels().any(|p| p.0 == [200, 200, 200, 255]));
    }

    #[test]
    fn test_render_empty_spectrum() {
        let transform = |p: f64| p;
        let axes = derive_wavelengths(&transform, 0, 0.0, WavelengthUnit::Meter, WavelengthUnit::Meter);
        let png = render_spectrum(&Spectrum::zeros(axes, FluxUnit::MegaJansky));
        assert_eq!(png.dimensions(), (PLOT_WIDTH, PLOT_HEIGHT));
    }
}
