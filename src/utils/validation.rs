use crate::core::{ConversionSettings, FilterSpec, MediaFile};
use crate::utils::{ConverterError, ConverterResult, MediaKind};

/// Validates batch settings before any file is touched
pub fn validate_settings(settings: &ConversionSettings) -> ConverterResult<()> {
    if !settings.quality.is_finite() || !(0.0..=1.0).contains(&settings.quality) {
        return Err(ConverterError::validation(format!(
            "Invalid quality value: {}. Must be between 0.0 and 1.0",
            settings.quality
        )));
    }

    if settings.resize.width == Some(0) {
        return Err(ConverterError::validation("Width cannot be 0"));
    }

    if settings.resize.height == Some(0) {
        return Err(ConverterError::validation("Height cannot be 0"));
    }

    let filters = &settings.filters;
    for (name, value) in [
        ("brightness", filters.brightness),
        ("contrast", filters.contrast),
        ("saturation", filters.saturation),
    ] {
        if !(FilterSpec::MIN..=FilterSpec::MAX).contains(&value) {
            return Err(ConverterError::validation(format!(
                "Invalid {name} value: {value}. Must be between {} and {}",
                FilterSpec::MIN,
                FilterSpec::MAX
            )));
        }
    }

    if !settings.image_format.is_image() {
        return Err(ConverterError::validation(format!(
            "{} is not an image format",
            settings.image_format
        )));
    }

    if !settings.video_format.is_video() {
        return Err(ConverterError::validation(format!(
            "{} is not a video format",
            settings.video_format
        )));
    }

    Ok(())
}

/// Splits a selection into convertible files and rejected ones.
///
/// Files that are neither image nor video never enter a batch; the caller
/// decides how to surface the returned errors.
pub fn partition_supported(files: Vec<MediaFile>) -> (Vec<MediaFile>, Vec<ConverterError>) {
    let mut supported = Vec::with_capacity(files.len());
    let mut rejected = Vec::new();
    for file in files {
        match MediaKind::classify(&file) {
            Ok(_) => supported.push(file),
            Err(e) => rejected.push(e),
        }
    }
    (supported, rejected)
}
