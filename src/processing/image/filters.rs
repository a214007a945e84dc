//! Colour filters with CSS `filter` semantics.
//!
//! The chain is `brightness(100+b%) contrast(100+c%) saturate(100+s%)`,
//! applied left to right with clamping after every step. Alpha is untouched.

use image::RgbaImage;
use crate::core::FilterSpec;

/// Linear coefficients of the three filters, in 0..1 channel space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FilterChain {
    brightness: f32,
    contrast: f32,
    saturate: f32,
}

impl From<FilterSpec> for FilterChain {
    fn from(spec: FilterSpec) -> Self {
        Self {
            brightness: coefficient(spec.brightness),
            contrast: coefficient(spec.contrast),
            saturate: coefficient(spec.saturation),
        }
    }
}

/// `100 + offset` percent as a factor, never negative.
fn coefficient(offset: i32) -> f32 {
    ((100.0 + offset as f32) / 100.0).max(0.0)
}

impl FilterChain {
    fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let mut rgb = rgb;
        if self.brightness != 1.0 {
            rgb = rgb.map(|c| (c * self.brightness).clamp(0.0, 1.0));
        }
        if self.contrast != 1.0 {
            rgb = rgb.map(|c| ((c - 0.5) * self.contrast + 0.5).clamp(0.0, 1.0));
        }
        if self.saturate == 1.0 {
            return rgb;
        }

        // feColorMatrix type="saturate"
        let [r, g, b] = rgb;
        let s = self.saturate;
        [
            (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b,
        ]
        .map(|c| c.clamp(0.0, 1.0))
    }
}

/// Applies `spec` to every pixel of `image` in place. No-op for the identity.
pub fn apply_filters(image: &mut RgbaImage, spec: FilterSpec) {
    if spec.is_identity() {
        return;
    }

    let chain = FilterChain::from(spec);
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let out = chain.apply([r, g, b].map(|c| c as f32 / 255.0));
        let [r, g, b] = out.map(|c| (c * 255.0).round() as u8);
        pixel.0 = [r, g, b, a];
    }
}
