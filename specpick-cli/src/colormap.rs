//! Colormap definitions and application logic.

use crate::util::f64_to_u8;
use std::str::FromStr;

/// Colormaps available for the picker image and selection overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    /// Black to white (`gist_gray`, `gray`).
    Grayscale,
    /// Black to red to yellow to white.
    Hot,
    /// Dark purple to teal to yellow.
    Viridis,
    /// Diverging red to white to blue; used for the selection overlay.
    RdBu,
}

impl std::fmt::Display for Colormap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Colormap::Grayscale => write!(f, "gist_gray"),
            Colormap::Hot => write!(f, "hot"),
            Colormap::Viridis => write!(f, "viridis"),
            Colormap::RdBu => write!(f, "RdBu"),
        }
    }
}

impl FromStr for Colormap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gist_gray" | "gray" | "grey" | "greys_r" => Ok(Colormap::Grayscale),
            "hot" | "afmhot" => Ok(Colormap::Hot),
            "viridis" => Ok(Colormap::Viridis),
            "rdbu" => Ok(Colormap::RdBu),
            _ => Err(format!(
                "unknown colormap {s:?} (expected gist_gray, hot, viridis or RdBu)"
            )),
        }
    }
}

const VIRIDIS: [[f64; 3]; 5] = [
    [68.0, 1.0, 84.0],
    [59.0, 82.0, 139.0],
    [33.0, 145.0, 140.0],
    [94.0, 201.0, 98.0],
    [253.0, 231.0, 37.0],
];

const RDBU: [[f64; 3]; 5] = [
    [103.0, 0.0, 31.0],
    [214.0, 96.0, 77.0],
    [247.0, 247.0, 247.0],
    [67.0, 147.0, 195.0],
    [5.0, 48.0, 97.0],
];

fn interpolate(anchors: &[[f64; 3]; 5], val: f64) -> [u8; 4] {
    let pos = val * 4.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let i = (pos.floor() as usize).min(3);
    let t = pos - crate::util::usize_to_f64(i);
    let (a, b) = (anchors[i], anchors[i + 1]);
    [
        f64_to_u8(a[0] + (b[0] - a[0]) * t),
        f64_to_u8(a[1] + (b[1] - a[1]) * t),
        f64_to_u8(a[2] + (b[2] - a[2]) * t),
        255,
    ]
}

impl Colormap {
    /// Apply the colormap to a normalized value in `[0, 1]`.
    ///
    /// Values outside the range are clipped; NaN maps to transparent.
    #[must_use]
    pub fn apply(self, val: f64) -> [u8; 4] {
        if val.is_nan() {
            return [0, 0, 0, 0];
        }
        let val = val.clamp(0.0, 1.0);
        match self {
            Colormap::Grayscale => {
                let v = f64_to_u8(val * 255.0);
                [v, v, v, 255]
            }
            Colormap::Hot => {
                let r = f64_to_u8(255.0 * (val / 0.365));
                let g = f64_to_u8(255.0 * ((val - 0.365) / 0.381));
                let b = f64_to_u8(255.0 * ((val - 0.746) / 0.254));
                [r, g, b, 255]
            }
            Colormap::Viridis => interpolate(&VIRIDIS, val),
            Colormap::RdBu => interpolate(&RDBU, val),
        }
    }
}
