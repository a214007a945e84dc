use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::core::{
    BatchSummary, ConversionResult, ConversionSettings, FileOutcome, MediaFile, Progress,
    ProgressSink, ProgressType,
};
use crate::processing::image::convert_image;
use crate::processing::video::{EngineProgress, VideoRun, VideoTranscoder};
use crate::utils::{
    Clock, ConverterError, ConverterResult, MediaKind, SystemClock, validate_settings,
};

use super::cancel::CancellationFlag;

/// Lifecycle of the orchestrator. Only one batch runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Completed,
}

/// Runs conversion batches one file at a time.
pub struct BatchOrchestrator {
    video: VideoTranscoder,
    clock: Arc<dyn Clock>,
    state: Mutex<BatchState>,
}

/// Moves the state out of `Running` when a run ends or its future is dropped.
struct RunGuard<'a> {
    state: &'a Mutex<BatchState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if *state == BatchState::Running {
            *state = BatchState::Completed;
        }
    }
}

fn lock(state: &Mutex<BatchState>) -> MutexGuard<'_, BatchState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl BatchOrchestrator {
    pub fn new(video: VideoTranscoder) -> Self {
        Self {
            video,
            clock: Arc::new(SystemClock),
            state: Mutex::new(BatchState::Idle),
        }
    }

    /// Replaces the clock used for `{date}`, `{time}` and `{timestamp}`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> BatchState {
        *lock(&self.state)
    }

    pub async fn run_batch(
        &self,
        files: Vec<MediaFile>,
        settings: &ConversionSettings,
        progress: &dyn ProgressSink,
    ) -> ConverterResult<BatchSummary> {
        self.run_batch_with_cancel(files, settings, progress, None).await
    }

    /// Converts `files` in order.
    ///
    /// Per-file failures are recorded and never abort the batch. Settings,
    /// input kinds and the single-run rule are checked before anything starts.
    pub async fn run_batch_with_cancel(
        &self,
        files: Vec<MediaFile>,
        settings: &ConversionSettings,
        progress: &dyn ProgressSink,
        cancel: Option<&CancellationFlag>,
    ) -> ConverterResult<BatchSummary> {
        validate_settings(settings)?;
        if files.is_empty() {
            return Err(ConverterError::validation("No files selected"));
        }
        for file in &files {
            MediaKind::classify(file)?;
        }

        let _guard = self.begin()?;
        let started = Instant::now();
        let total = files.len();

        info!("Processing batch of {} files", total);
        progress.report(Progress::new(ProgressType::Start, 0, total, "Starting conversion"));

        let mut run = self.video.begin_run();
        let mut results = Vec::with_capacity(total);
        let mut outcomes = Vec::with_capacity(total);
        let mut failure_count = 0;
        let mut cancelled = false;

        for (index, file) in files.iter().enumerate() {
            let completed = index + 1;
            match self.convert_one(&mut run, file, settings, index, total, progress).await {
                Ok(result) => {
                    progress.report(
                        Progress::new(
                            ProgressType::Progress,
                            completed,
                            total,
                            format!("Converted {}", file.name()),
                        )
                        .with_file(file.name())
                        .with_metadata(serde_json::json!({
                            "outputName": result.output_name,
                            "originalSize": result.original_size,
                            "convertedSize": result.converted_size,
                            "compressionRatio": result.compression_ratio,
                            "requiresServerConversion": result.requires_server_conversion,
                        })),
                    );
                    outcomes.push(FileOutcome::Converted { result: result.clone() });
                    results.push(result);
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!("Conversion failed for {}: {}", file.name(), error);
                    failure_count += 1;
                    progress.report(
                        Progress::new(
                            ProgressType::Error,
                            completed,
                            total,
                            format!("Failed {}", file.name()),
                        )
                        .with_file(file.name())
                        .with_error(error.clone()),
                    );
                    outcomes.push(FileOutcome::Failed { file_name: file.name().to_string(), error });
                }
            }

            tokio::task::yield_now().await;

            if completed < total && cancel.is_some_and(CancellationFlag::is_cancelled) {
                info!("Batch cancelled after {} of {} files", completed, total);
                cancelled = true;
                break;
            }
        }

        let success_count = results.len();
        let duration_seconds = started.elapsed().as_secs_f64();

        if failure_count > 0 {
            warn!(
                "Batch completed with {} failed files out of {}",
                failure_count,
                outcomes.len()
            );
        } else {
            info!("Batch completed successfully: {} files converted", success_count);
        }

        progress.report(Progress::new(
            ProgressType::Complete,
            outcomes.len(),
            total,
            if cancelled { "Cancelled" } else { "Complete" },
        ));

        Ok(BatchSummary {
            results,
            outcomes,
            success_count,
            failure_count,
            duration_seconds,
            cancelled,
        })
    }

    fn begin(&self) -> ConverterResult<RunGuard<'_>> {
        let mut state = lock(&self.state);
        if *state == BatchState::Running {
            return Err(ConverterError::AlreadyRunning);
        }
        *state = BatchState::Running;
        Ok(RunGuard { state: &self.state })
    }

    async fn convert_one(
        &self,
        run: &mut VideoRun<'_>,
        file: &MediaFile,
        settings: &ConversionSettings,
        index: usize,
        total: usize,
        progress: &dyn ProgressSink,
    ) -> ConverterResult<ConversionResult> {
        match MediaKind::classify(file)? {
            MediaKind::Image => {
                debug!("[{}/{}] image '{}'", index + 1, total, file.name());
                convert_image(file, settings, index, self.clock.as_ref()).await
            }
            MediaKind::Video => {
                debug!("[{}/{}] video '{}'", index + 1, total, file.name());
                let relay = |p: EngineProgress| {
                    let mut event = Progress::new(ProgressType::Transcoding, index, total, "Transcoding")
                        .with_file(file.name())
                        .with_metadata(serde_json::json!({
                            "fraction": p.fraction,
                            "elapsedMs": p.elapsed.as_millis() as u64,
                        }));
                    event.progress_percentage = (index as f64 + p.fraction) / total as f64 * 100.0;
                    progress.report(event);
                };
                run.convert(file, settings, index, self.clock.as_ref(), &relay).await
            }
        }
    }
}
