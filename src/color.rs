//! Conversion into the perceptual color space and the color difference used for matching.
//!
//! Colors are converted from sRGB into CIELAB (D65 white point) and then stored in the common
//! 8-bit device encoding of CIELAB, where lightness is scaled to `0..=255` and both chroma axes
//! are offset by `128`. That encoding is compact but its components do not share a unit,
//! so it has to be [normalized](EncodedLab::normalize) before taking a Euclidean distance.

use palette::{FromColor, Lab, LinSrgb, Srgb};
use serde::Serialize;
use std::fmt::{self, Display};

/// Factor that maps the encoded lightness onto the `0..100` scale used for distances.
const LIGHTNESS_SCALE: f32 = 100.0 / 256.0;

/// Offset of both chroma axes in the 8-bit encoding.
const CHROMA_OFFSET: f32 = 128.0;

/// A CIELAB color in the 8-bit device encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EncodedLab {
    /// Lightness, `L* * 255 / 100`.
    pub l: u8,
    /// Green-red axis, `a* + 128`.
    pub a: u8,
    /// Blue-yellow axis, `b* + 128`.
    pub b: u8,
}

impl EncodedLab {
    /// Creates a new [`EncodedLab`] from its raw components.
    #[must_use]
    pub const fn new(l: u8, a: u8, b: u8) -> Self {
        Self { l, a, b }
    }

    /// Converts an sRGB color into the 8-bit CIELAB encoding.
    #[must_use]
    pub fn from_srgb(srgb: Srgb<u8>) -> Self {
        let linear: LinSrgb = srgb.into_linear();
        let lab: Lab = Lab::from_color(linear);
        Self {
            l: encode_component(lab.l * 255.0 / 100.0),
            a: encode_component(lab.a + CHROMA_OFFSET),
            b: encode_component(lab.b + CHROMA_OFFSET),
        }
    }

    /// Rescales the components into a space where Euclidean distance is meaningful:
    /// lightness onto `0..100` and both chroma axes centered on zero.
    #[must_use]
    pub fn normalize(self) -> NormalizedLab {
        NormalizedLab([
            f32::from(self.l) * LIGHTNESS_SCALE,
            f32::from(self.a) - CHROMA_OFFSET,
            f32::from(self.b) - CHROMA_OFFSET,
        ])
    }

    /// The components as an array.
    #[must_use]
    pub const fn into_array(self) -> [u8; 3] {
        [self.l, self.a, self.b]
    }
}

impl Display for EncodedLab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.l, self.a, self.b)
    }
}

/// Rounds and saturates a component into a `u8`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_component(value: f32) -> u8 {
    // `as` saturates, NaN becomes 0
    value.round().clamp(0.0, 255.0) as u8
}

/// A normalized CIELAB triple, only used for distance comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[repr(transparent)]
pub struct NormalizedLab(pub [f32; 3]);

impl NormalizedLab {
    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        distance(self, other)
    }
}

impl Display for NormalizedLab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [l, a, b] = self.0;
        write!(f, "{l} {a} {b}")
    }
}

/// Squared euclidean distance between two points.
fn squared_euclidean_distance<const N: usize>(x: [f32; N], y: [f32; N]) -> f32 {
    let mut dist = 0.0;
    for c in 0..N {
        let d = x[c] - y[c];
        dist += d * d;
    }
    dist
}

/// The color difference between two normalized colors: `sqrt(dL² + da² + db²)`.
///
/// No component weighting is applied.
#[must_use]
pub fn distance(x: NormalizedLab, y: NormalizedLab) -> f32 {
    squared_euclidean_distance(x.0, y.0).sqrt()
}

/// Converts every pixel of an RGB buffer into the 8-bit CIELAB encoding, in order.
#[must_use]
pub fn encode_pixels(pixels: &[Srgb<u8>]) -> Vec<EncodedLab> {
    pixels.iter().copied().map(EncodedLab::from_srgb).collect()
}
