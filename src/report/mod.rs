//! Presentation records for finished conversions.
//!
//! Everything here is pure formatting over [`ConversionResult`] and
//! [`BatchSummary`]; nothing touches the filesystem or the engine.

use std::fmt;
use serde::Serialize;

use crate::core::{BatchSummary, ConversionResult, FileOutcome, MediaFile};
use crate::utils::{mime_from_extension, mime_type_for, resolve_format};

/// One row of a conversion report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    pub original_name: String,
    /// Format of the input as resolved from its MIME type or name
    pub original_format: String,
    pub output_name: String,
    /// MIME type to serve the output with
    pub mime_type: String,
    pub original_size: String,
    pub converted_size: String,
    /// `WxH` of the output
    pub dimensions: String,
    pub original_dimensions: Option<String>,
    /// Size change, e.g. `"25.0%"` or `"-12.5%"`
    pub compression: String,
    /// `m:ss`, videos only
    pub duration: Option<String>,
    pub is_video: bool,
    pub requires_server_conversion: bool,
}

impl ConversionReport {
    pub fn from_result(original: &MediaFile, result: &ConversionResult) -> Self {
        let original_dimensions = match (result.original_width, result.original_height) {
            (Some(w), Some(h)) => Some(format!("{w}x{h}")),
            _ => None,
        };

        Self {
            original_name: original.name().to_string(),
            original_format: resolve_format(original),
            output_name: result.output_name.clone(),
            mime_type: output_mime(result).to_string(),
            original_size: format_bytes(result.original_size),
            converted_size: format_bytes(result.converted_size),
            dimensions: format!("{}x{}", result.width, result.height),
            original_dimensions,
            compression: format!("{:.1}%", result.compression_ratio),
            duration: result.duration_seconds.map(format_duration),
            is_video: result.is_video,
            requires_server_conversion: result.requires_server_conversion,
        }
    }
}

fn output_mime(result: &ConversionResult) -> &'static str {
    if result.is_video {
        mime_from_extension(&result.output_name).unwrap_or("application/octet-stream")
    } else {
        mime_type_for(&result.format)
    }
}

/// Human-readable size with base 1024, e.g. `"0 Bytes"`, `"1.5 KB"`, `"2 MB"`.
///
/// Up to two decimals; trailing zeros are trimmed.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut exponent = 0;
    while value >= 1024.0 && exponent < UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exponent])
}

/// `m:ss`, with minutes unbounded.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds.round() as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}

/// `"Converted N file(s), M failed in X.Ys"`.
pub fn summary_message(summary: &BatchSummary) -> String {
    let mut message = format!(
        "Converted {} file(s), {} failed in {:.1}s",
        summary.success_count, summary.failure_count, summary.duration_seconds
    );
    if summary.cancelled {
        message.push_str(" (cancelled)");
    }
    message
}

/// Plain-text report of a whole batch, one line per input.
pub struct BatchReport<'a> {
    summary: &'a BatchSummary,
    originals: &'a [MediaFile],
}

impl<'a> BatchReport<'a> {
    /// `originals` are the batch inputs, in the order they were submitted.
    pub fn new(summary: &'a BatchSummary, originals: &'a [MediaFile]) -> Self {
        Self { summary, originals }
    }

    /// Report rows for the successful conversions.
    pub fn rows(&self) -> Vec<ConversionReport> {
        self.summary
            .outcomes
            .iter()
            .zip(self.originals)
            .filter_map(|(outcome, original)| match outcome {
                FileOutcome::Converted { result } => Some(ConversionReport::from_result(original, result)),
                FileOutcome::Failed { .. } => None,
            })
            .collect()
    }
}

impl fmt::Display for BatchReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (outcome, original) in self.summary.outcomes.iter().zip(self.originals) {
            match outcome {
                FileOutcome::Converted { result } => {
                    let row = ConversionReport::from_result(original, result);
                    write!(
                        f,
                        "✓ {} → {} ({} → {}, {}, {})",
                        row.original_name,
                        row.output_name,
                        row.original_size,
                        row.converted_size,
                        row.dimensions,
                        row.compression
                    )?;
                    if let Some(duration) = &row.duration {
                        write!(f, " [{duration}]")?;
                    }
                    if row.requires_server_conversion {
                        write!(f, " (not transcoded, requires server conversion)")?;
                    }
                    writeln!(f)?;
                }
                FileOutcome::Failed { file_name, error } => {
                    writeln!(f, "✗ {file_name}: {error}")?;
                }
            }
        }
        write!(f, "{}", summary_message(self.summary))
    }
}
