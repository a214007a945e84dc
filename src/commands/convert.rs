//! Batch conversion command.

use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{AppState, BatchSummary, ConversionSettings, MediaFile, ProgressSink};
use crate::report::{BatchReport, ConversionReport, summary_message};
use crate::utils::{ConverterError, ConverterResult, partition_supported, write_result};

/// What a finished `convert` call hands back to the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOutput {
    pub summary: BatchSummary,
    /// Batch inputs, aligned with `summary.outcomes`
    #[serde(skip)]
    pub inputs: Vec<MediaFile>,
    /// Report rows for the converted files, in input order
    pub reports: Vec<ConversionReport>,
    /// Paths written to the output directory
    pub written: Vec<PathBuf>,
    /// Inputs turned away before the batch, e.g. files that are neither image nor video
    pub rejected: Vec<String>,
    pub message: String,
}

/// Inputs read from disk, split before they reach the batch.
#[derive(Debug, Default)]
pub struct LoadedInputs {
    pub files: Vec<MediaFile>,
    pub rejected: Vec<ConverterError>,
}

/// Loads `inputs` from disk.
///
/// Directories are expanded one level and entries that are not images or
/// videos are skipped quietly. Explicitly named files that are neither end up
/// in `rejected` and never enter a batch. Unreadable paths are logged and
/// skipped.
pub async fn load_inputs(inputs: &[PathBuf]) -> ConverterResult<LoadedInputs> {
    let mut loaded = LoadedInputs::default();
    let mut read_any = false;

    for input in inputs {
        if input.is_dir() {
            let (supported, skipped) = partition_supported(read_dir_files(input).await?);
            for rejected in &skipped {
                debug!("Skipping {}", rejected);
            }
            read_any = true;
            loaded.files.extend(supported);
            continue;
        }
        match MediaFile::from_path(input).await {
            Ok(file) => {
                read_any = true;
                let (supported, rejected) = partition_supported(vec![file]);
                loaded.files.extend(supported);
                loaded.rejected.extend(rejected);
            }
            Err(e) => warn!("Skipping '{}': {}", input.display(), e),
        }
    }

    if !read_any {
        return Err(ConverterError::validation("None of the given inputs could be read"));
    }
    Ok(loaded)
}

async fn read_dir_files(dir: &Path) -> ConverterResult<Vec<MediaFile>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(MediaFile::from_path(&path).await?);
    }
    Ok(files)
}

/// Converts `inputs` and writes every successful result into `output_dir`.
pub async fn convert_files(
    state: &AppState,
    inputs: &[PathBuf],
    settings: &ConversionSettings,
    output_dir: &Path,
    progress: &dyn ProgressSink,
) -> ConverterResult<ConvertOutput> {
    let LoadedInputs { files, rejected } = load_inputs(inputs).await?;
    for e in &rejected {
        warn!("Not converting: {}", e);
    }
    if files.is_empty() {
        return Err(match rejected.into_iter().next() {
            Some(e) => e,
            None => ConverterError::validation("No images or videos among the given inputs"),
        });
    }
    debug!("Received convert command for {} files", files.len());

    let summary = state.orchestrator().run_batch(files.clone(), settings, progress).await?;

    let mut written = Vec::with_capacity(summary.success_count);
    for result in &summary.results {
        written.push(write_result(output_dir, result).await?);
    }
    let reports = BatchReport::new(&summary, &files).rows();

    let message = summary_message(&summary);
    info!("{} → {}", message, output_dir.display());

    let rejected = rejected.iter().map(ToString::to_string).collect();
    Ok(ConvertOutput { summary, inputs: files, reports, written, rejected, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::NoProgress;
    use crate::utils::TargetFormat;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    fn write_png(path: &Path) {
        let img = RgbImage::from_pixel(16, 8, Rgb([10, 20, 30]));
        DynamicImage::ImageRgb8(img).save_with_format(path, ImageFormat::Png).unwrap();
    }

    #[tokio::test]
    async fn converts_and_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        write_png(&input);
        let out = dir.path().join("out");

        let state = AppState::new(AppConfig::default()).unwrap();
        let settings = ConversionSettings { image_format: TargetFormat::BMP, ..Default::default() };

        let output = convert_files(&state, &[input], &settings, &out, &NoProgress).await.unwrap();

        assert_eq!(output.summary.success_count, 1);
        assert_eq!(output.written, [out.join("photo.bmp")]);
        assert!(out.join("photo.bmp").exists());
        assert_eq!(output.reports[0].dimensions, "16x8");
        assert!(output.message.starts_with("Converted 1 file(s), 0 failed"));
    }

    #[tokio::test]
    async fn directories_skip_non_media_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"));
        std::fs::write(dir.path().join("readme.txt"), b"hello").unwrap();
        let named = dir.path().join("readme.txt");

        let from_dir = load_inputs(&[dir.path().to_path_buf()]).await.unwrap();
        assert_eq!(from_dir.files.len(), 1);
        assert_eq!(from_dir.files[0].name(), "a.png");
        assert!(from_dir.rejected.is_empty());

        let explicit = load_inputs(&[named]).await.unwrap();
        assert!(explicit.files.is_empty());
        assert!(matches!(explicit.rejected[..], [ConverterError::UnsupportedInput { .. }]));
    }

    #[tokio::test]
    async fn unsupported_inputs_never_reach_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("photo.png");
        let notes = dir.path().join("notes.txt");
        write_png(&photo);
        std::fs::write(&notes, b"hello").unwrap();
        let out = dir.path().join("out");
        let state = AppState::new(AppConfig::default()).unwrap();
        let settings = ConversionSettings { image_format: TargetFormat::PNG, ..Default::default() };

        let output = convert_files(&state, &[photo, notes.clone()], &settings, &out, &NoProgress)
            .await
            .unwrap();

        assert_eq!(output.summary.outcomes.len(), 1);
        assert_eq!(output.summary.failure_count, 0);
        assert_eq!(output.rejected.len(), 1);
        assert!(output.rejected[0].contains("notes.txt"));

        let err = convert_files(&state, &[notes], &settings, &out, &NoProgress).await.unwrap_err();
        assert!(matches!(err, ConverterError::UnsupportedInput { .. }));
    }

    #[tokio::test]
    async fn unreadable_inputs_only_is_an_error() {
        let err = load_inputs(&[PathBuf::from("/nonexistent/input.png")]).await.unwrap_err();
        assert!(matches!(err, ConverterError::Validation(_)));
    }
}
