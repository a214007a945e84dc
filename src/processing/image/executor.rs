//! Image transform stage.
//!
//! Decoding, filtering, resampling and encoding run inside
//! `tokio::task::spawn_blocking`, so the batch task only awaits the result.
//! The decoded surface is owned by the blocking closure and dropped on every
//! exit path.

use image::DynamicImage;
use tracing::debug;

use crate::core::{ConversionResult, ConversionSettings, FilterSpec, MediaFile, ResizeSpec, compression_ratio};
use crate::utils::{Clock, ConverterError, ConverterResult, TargetFormat, output_file_name};

use super::filters::apply_filters;
use super::formats::encode_image;
use super::resize::{resample, target_size};

/// Pixel-level output of one transform.
struct Transformed {
    bytes: Vec<u8>,
    original: (u32, u32),
    output: (u32, u32),
}

/// Converts one image according to `settings`.
///
/// `index` is the zero-based position of the file in its batch and only
/// feeds the output name.
pub async fn convert_image(
    file: &MediaFile,
    settings: &ConversionSettings,
    index: usize,
    clock: &dyn Clock,
) -> ConverterResult<ConversionResult> {
    let data = file.read_bytes().await?;
    let name = file.name().to_string();
    let target = settings.image_format;
    let quality = settings.quality;
    let filters = settings.filters;
    let resize = settings.resize;

    let transformed = tokio::task::spawn_blocking(move || {
        transform(&name, &data, target, quality, filters, resize)
    })
    .await
    .map_err(|e| ConverterError::encode(file.name(), format!("Task panicked: {e}")))??;

    let converted_size = transformed.bytes.len() as u64;
    let ratio = compression_ratio(file.size(), converted_size);

    let quality_note = if target.is_lossy() { format!(" q={quality:.2}") } else { String::new() };
    debug!(
        "'{}' {}×{} → {}×{} {}{} ({} → {} bytes, {:.1}%)",
        file.name(),
        transformed.original.0,
        transformed.original.1,
        transformed.output.0,
        transformed.output.1,
        target,
        quality_note,
        file.size(),
        converted_size,
        ratio
    );

    Ok(ConversionResult {
        output_name: output_file_name(&settings.filename_pattern, file.name(), index, target.extension(), clock),
        output_bytes: transformed.bytes.into(),
        original_size: file.size(),
        converted_size,
        format: target.extension().to_string(),
        width: transformed.output.0,
        height: transformed.output.1,
        original_width: Some(transformed.original.0),
        original_height: Some(transformed.original.1),
        duration_seconds: None,
        compression_ratio: ratio,
        is_video: false,
        requires_server_conversion: false,
    })
}

fn transform(
    name: &str,
    data: &[u8],
    target: TargetFormat,
    quality: f32,
    filters: FilterSpec,
    resize: ResizeSpec,
) -> ConverterResult<Transformed> {
    let decoded = image::load_from_memory(data).map_err(|e| ConverterError::decode(name, e))?;
    let original = (decoded.width(), decoded.height());
    let (width, height) = target_size(&decoded, &resize);

    let surface = if filters.is_identity() {
        decoded
    } else {
        let mut pixels = decoded.into_rgba8();
        apply_filters(&mut pixels, filters);
        DynamicImage::ImageRgba8(pixels)
    };
    let surface = resample(surface, width, height);

    let bytes = encode_image(&surface, target, quality, name)?;
    Ok(Transformed { bytes, original, output: (width, height) })
}
