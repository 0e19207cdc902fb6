//! Numeric conversion utilities for specpick-cli.
//!
//! These functions handle conversions between numeric types with explicit
//! handling of precision loss and bounds checking.

/// Convert usize to f64 with allowed precision loss.
#[allow(clippy::cast_precision_loss)]
pub fn usize_to_f64(value: usize) -> f64 {
    value as f64
}

/// Convert u32 to f64.
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Convert f64 to u8 with clamping to [0, 255].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn f64_to_u8(value: f64) -> u8 {
    let clamped = value.clamp(0.0, 255.0);
    clamped.round() as u8
}

/// Convert f64 to a pixel coordinate in `[0, max_exclusive)`.
///
/// Returns `None` if the value is not finite or falls outside the range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn f64_to_pixel(value: f64, max_exclusive: u32) -> Option<u32> {
    if !value.is_finite() || value < 0.0 || value >= u32_to_f64(max_exclusive) {
        return None;
    }
    Some(value.floor() as u32)
}
