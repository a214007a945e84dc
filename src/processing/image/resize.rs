//! Resampling to the computed output size.

use image::DynamicImage;
use image::imageops::FilterType;
use crate::core::ResizeSpec;
use crate::utils::compute_dimensions;

/// Output size for `image` under `spec`.
pub fn target_size(image: &DynamicImage, spec: &ResizeSpec) -> (u32, u32) {
    compute_dimensions(image.width(), image.height(), spec.width, spec.height, spec.aspect_locked)
}

/// Resamples `image` to exactly `width`×`height` with Lanczos3.
///
/// Returns the image unchanged when it already has that size.
pub fn resample(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        return image;
    }
    image.resize_exact(width, height, FilterType::Lanczos3)
}
