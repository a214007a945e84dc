//! Encodes an output surface to the target image format.
//!
//! Quality only reaches the lossy encoders, JPEG through the `image` crate
//! and WebP through libwebp. PNG, GIF and BMP ignore it.

use std::io::Cursor;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use crate::utils::{ConverterError, ConverterResult, TargetFormat};

type Result<T> = ConverterResult<T>;

/// Maps 0.0..=1.0 onto the JPEG 1..=100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encodes `image` as `target`; `file` names the source for error messages.
pub fn encode_image(image: &DynamicImage, target: TargetFormat, quality: f32, file: &str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    match target {
        TargetFormat::JPEG => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality));
            DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|e| ConverterError::encode(file, e))?;
        }
        TargetFormat::BMP => write_as(&DynamicImage::ImageRgb8(image.to_rgb8()), ImageFormat::Bmp, &mut buffer, file)?,
        TargetFormat::PNG => write_as(&rgba(image), ImageFormat::Png, &mut buffer, file)?,
        TargetFormat::WebP => buffer = encode_webp(image, quality),
        TargetFormat::GIF => write_as(&rgba(image), ImageFormat::Gif, &mut buffer, file)?,
        video => {
            return Err(ConverterError::encode(
                file,
                format!("{video} is not an image format"),
            ));
        }
    }
    Ok(buffer)
}

/// Maps 0.0..=1.0 onto the libwebp 0..=100 scale.
pub fn webp_quality(quality: f32) -> f32 {
    (quality * 100.0).clamp(0.0, 100.0)
}

fn encode_webp(image: &DynamicImage, quality: f32) -> Vec<u8> {
    let surface = image.to_rgba8();
    webp::Encoder::from_rgba(surface.as_raw(), surface.width(), surface.height())
        .encode(webp_quality(quality))
        .to_vec()
}

fn rgba(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgba8(_) => image.clone(),
        other => DynamicImage::ImageRgba8(other.to_rgba8()),
    }
}

fn write_as(image: &DynamicImage, format: ImageFormat, buffer: &mut Vec<u8>, file: &str) -> Result<()> {
    image
        .write_to(&mut Cursor::new(buffer), format)
        .map_err(|e| ConverterError::encode(file, e))
}
