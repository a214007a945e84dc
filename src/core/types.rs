//! Core types for conversion settings and results.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::utils::TargetFormat;

/// Settings for one batch run.
///
/// Built once before the run starts and passed by reference to every stage;
/// nothing in the pipeline reads settings from anywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionSettings {
    /// Target for image inputs
    pub image_format: TargetFormat,
    /// Target for video inputs
    pub video_format: TargetFormat,
    /// Encoder quality in 0.0..=1.0, used by jpeg, webp and video codecs
    pub quality: f32,
    /// Resize settings for output dimensions
    pub resize: ResizeSpec,
    /// Colour adjustments applied to images
    pub filters: FilterSpec,
    /// Output name template, see `utils::pattern`
    pub filename_pattern: String,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            image_format: TargetFormat::WebP,
            video_format: TargetFormat::MP4,
            quality: 0.8,
            resize: ResizeSpec::default(),
            filters: FilterSpec::default(),
            filename_pattern: "{name}".to_string(),
        }
    }
}

/// Resize settings for output dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeSpec {
    /// Target width in pixels
    pub width: Option<u32>,
    /// Target height in pixels
    pub height: Option<u32>,
    /// Derive the missing dimension from the original ratio
    pub aspect_locked: bool,
}

impl Default for ResizeSpec {
    fn default() -> Self {
        Self { width: None, height: None, aspect_locked: true }
    }
}

impl ResizeSpec {
    pub fn is_set(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

/// Brightness/contrast/saturation offsets in percent, each within -100..=100.
///
/// Zero means no change; an offset maps onto the CSS filter value `100 + offset`%.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
}

impl FilterSpec {
    pub const MIN: i32 = -100;
    pub const MAX: i32 = 100;

    pub fn new(brightness: i32, contrast: i32, saturation: i32) -> Self {
        Self {
            brightness: brightness.clamp(Self::MIN, Self::MAX),
            contrast: contrast.clamp(Self::MIN, Self::MAX),
            saturation: saturation.clamp(Self::MIN, Self::MAX),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 0 && self.contrast == 0 && self.saturation == 0
    }
}

/// Outcome of converting one file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// File name of the converted output, extension included
    pub output_name: String,
    /// Encoded output; identical to the input on the fallback path
    #[serde(skip)]
    pub output_bytes: Arc<[u8]>,
    /// Original file size in bytes
    pub original_size: u64,
    /// Output size in bytes
    pub converted_size: u64,
    /// Output format label
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub original_width: Option<u32>,
    pub original_height: Option<u32>,
    /// Duration in seconds, videos only
    pub duration_seconds: Option<f64>,
    /// Size reduction in percent, negative when the output grew
    pub compression_ratio: f64,
    pub is_video: bool,
    /// The engine could not transcode; bytes were passed through untouched
    pub requires_server_conversion: bool,
}

/// `(1 - converted / original) * 100`, rounded to one decimal.
///
/// An empty original yields 0 rather than a division by zero.
pub fn compression_ratio(original_size: u64, converted_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let ratio = (1.0 - converted_size as f64 / original_size as f64) * 100.0;
    (ratio * 10.0).round() / 10.0
}

/// Per-file outcome recorded by the batch orchestrator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum FileOutcome {
    Converted { result: ConversionResult },
    Failed { file_name: String, error: String },
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

/// Final aggregate of a batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Successful results in input order
    pub results: Vec<ConversionResult>,
    /// One entry per processed input, in input order
    pub outcomes: Vec<FileOutcome>,
    pub success_count: usize,
    pub failure_count: usize,
    pub duration_seconds: f64,
    /// The run stopped early at a yield point
    pub cancelled: bool,
}
