//! Video transcode stage with its passthrough fallback.
//!
//! A transcode runs exactly once per file. When the engine is unavailable or
//! the transcode fails, the original bytes are returned untouched and the
//! result is flagged with `requires_server_conversion`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::core::{ConversionResult, ConversionSettings, MediaFile, compression_ratio};
use crate::utils::{
    Clock, ConverterError, ConverterResult, TargetFormat, compute_dimensions, extension_of,
    output_file_name,
};

use super::codecs::{build_codec_args, transcode_args};
use super::engine::{EngineProgressFn, TranscodeEngine};
use super::loader::EngineSlot;
use super::probe::{MediaProber, VideoMetadata};

static WORKING_NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Input and output names inside the engine namespace, unique per call.
fn working_names(input_ext: &str, target: TargetFormat) -> (String, String) {
    let n = WORKING_NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    let millis = chrono::Utc::now().timestamp_millis();
    (
        format!("input_{n}_{millis}.{input_ext}"),
        format!("output_{n}_{millis}.{}", target.extension()),
    )
}

/// Converts videos through the shared engine slot.
pub struct VideoTranscoder {
    slot: Arc<EngineSlot>,
    prober: Arc<dyn MediaProber>,
}

impl VideoTranscoder {
    pub fn new(slot: Arc<EngineSlot>, prober: Arc<dyn MediaProber>) -> Self {
        Self { slot, prober }
    }

    /// Starts a run. Within one run, an engine load failure is remembered and
    /// later videos go straight to the fallback.
    pub fn begin_run(&self) -> VideoRun<'_> {
        VideoRun { transcoder: self, engine_failed: false }
    }

    /// Converts a single video outside of any batch run.
    pub async fn convert_video(
        &self,
        file: &MediaFile,
        settings: &ConversionSettings,
        index: usize,
        clock: &dyn Clock,
        progress: EngineProgressFn<'_>,
    ) -> ConverterResult<ConversionResult> {
        self.begin_run().convert(file, settings, index, clock, progress).await
    }
}

/// Per-run view of a [`VideoTranscoder`].
pub struct VideoRun<'a> {
    transcoder: &'a VideoTranscoder,
    engine_failed: bool,
}

impl VideoRun<'_> {
    pub fn engine_failed(&self) -> bool {
        self.engine_failed
    }

    pub async fn convert(
        &mut self,
        file: &MediaFile,
        settings: &ConversionSettings,
        index: usize,
        clock: &dyn Clock,
        progress: EngineProgressFn<'_>,
    ) -> ConverterResult<ConversionResult> {
        let data = file.read_bytes().await?;
        let target = settings.video_format;
        let output_name = output_file_name(
            &settings.filename_pattern,
            file.name(),
            index,
            target.extension(),
            clock,
        );

        let engine = self.engine().await;
        let Some(engine) = engine else {
            debug!("'{}': engine unavailable, passing bytes through", file.name());
            return self.fallback(file, data, target, output_name).await;
        };

        match transcode(engine.as_ref(), file, &data, settings, progress).await {
            Ok(bytes) => self.transcoded(file, &data, settings, output_name, bytes).await,
            Err(e) => {
                warn!("'{}': transcode failed, passing bytes through: {}", file.name(), e);
                self.fallback(file, data, target, output_name).await
            }
        }
    }

    async fn engine(&mut self) -> Option<Arc<dyn TranscodeEngine>> {
        if self.engine_failed {
            return None;
        }
        match self.transcoder.slot.ensure_ready().await {
            Ok(engine) => Some(engine),
            Err(e) => {
                warn!("Transcoding engine unavailable for this run: {}", e);
                self.engine_failed = true;
                None
            }
        }
    }

    async fn transcoded(
        &self,
        file: &MediaFile,
        original: &[u8],
        settings: &ConversionSettings,
        output_name: String,
        bytes: Vec<u8>,
    ) -> ConverterResult<ConversionResult> {
        let prober = &self.transcoder.prober;
        let source = prober.probe(file.name(), original).await.ok();

        let output = match prober.probe(&output_name, &bytes).await {
            Ok(meta) => meta,
            Err(e) => {
                // Estimate from the source when the output cannot be read back.
                let Some(src) = source else {
                    return Err(ConverterError::media_read(file.name(), e));
                };
                let resize = settings.resize;
                let (width, height) = compute_dimensions(
                    src.width,
                    src.height,
                    resize.width,
                    resize.height,
                    resize.aspect_locked,
                );
                debug!("'{}': output probe failed ({}), using source metadata", file.name(), e);
                VideoMetadata { width, height, duration_seconds: src.duration_seconds }
            }
        };

        let converted_size = bytes.len() as u64;
        let ratio = compression_ratio(file.size(), converted_size);
        debug!(
            "'{}' → {} {}×{} ({} → {} bytes, {:.1}%)",
            file.name(),
            output_name,
            output.width,
            output.height,
            file.size(),
            converted_size,
            ratio
        );

        Ok(ConversionResult {
            output_name,
            output_bytes: bytes.into(),
            original_size: file.size(),
            converted_size,
            format: settings.video_format.extension().to_string(),
            width: output.width,
            height: output.height,
            original_width: source.map(|m| m.width),
            original_height: source.map(|m| m.height),
            duration_seconds: output.duration_seconds.or(source.and_then(|m| m.duration_seconds)),
            compression_ratio: ratio,
            is_video: true,
            requires_server_conversion: false,
        })
    }

    async fn fallback(
        &self,
        file: &MediaFile,
        data: Arc<[u8]>,
        target: TargetFormat,
        output_name: String,
    ) -> ConverterResult<ConversionResult> {
        let meta = self
            .transcoder
            .prober
            .probe(file.name(), &data)
            .await
            .map_err(|e| match e {
                ConverterError::MediaRead { .. } => e,
                other => ConverterError::media_read(file.name(), other),
            })?;

        Ok(ConversionResult {
            output_name,
            output_bytes: data,
            original_size: file.size(),
            converted_size: file.size(),
            format: target.extension().to_string(),
            width: meta.width,
            height: meta.height,
            original_width: Some(meta.width),
            original_height: Some(meta.height),
            duration_seconds: meta.duration_seconds,
            compression_ratio: compression_ratio(file.size(), file.size()),
            is_video: true,
            requires_server_conversion: true,
        })
    }
}

/// Writes the input, runs the engine once, reads the output and removes both
/// working entries whatever the outcome.
async fn transcode(
    engine: &dyn TranscodeEngine,
    file: &MediaFile,
    data: &[u8],
    settings: &ConversionSettings,
    progress: EngineProgressFn<'_>,
) -> ConverterResult<Vec<u8>> {
    let ext = extension_of(file.name());
    let ext = if ext.is_empty() { "bin".to_string() } else { ext };
    let (input, output) = working_names(&ext, settings.video_format);

    engine.write_input(&input, data).await?;

    let codec_args = build_codec_args(settings.video_format, settings.quality, &settings.resize);
    let args = transcode_args(&input, &output, codec_args);
    debug!("'{}': ffmpeg {}", file.name(), args.join(" "));

    let result = match engine.exec(&args, progress).await {
        Ok(()) => engine.read_output(&output).await,
        Err(e) => Err(e),
    };

    for name in [&input, &output] {
        if let Err(e) = engine.delete_file(name).await {
            warn!("Failed to delete working file '{}': {}", name, e);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResizeSpec;
    use crate::utils::FixedClock;
    use crate::processing::video::testing::{StubEngine, StubProber};
    use chrono::{Local, TimeZone};
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;

    fn clock() -> FixedClock {
        FixedClock(Local.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap())
    }

    fn video(name: &str, size: usize) -> MediaFile {
        MediaFile::new(name, Some("video/quicktime".into()), vec![7u8; size])
    }

    fn settings(target: TargetFormat) -> ConversionSettings {
        ConversionSettings { video_format: target, quality: 0.5, ..Default::default() }
    }

    fn transcoder(engine: Arc<StubEngine>, prober: Arc<StubProber>) -> VideoTranscoder {
        VideoTranscoder::new(Arc::new(EngineSlot::new(engine)), prober)
    }

    fn silent(_: crate::processing::video::EngineProgress) {}

    #[test]
    fn working_names_are_unique() {
        let (a_in, a_out) = working_names("mov", TargetFormat::MP4);
        let (b_in, _) = working_names("mov", TargetFormat::MP4);
        assert_ne!(a_in, b_in);
        assert!(a_in.starts_with("input_") && a_in.ends_with(".mov"));
        assert!(a_out.starts_with("output_") && a_out.ends_with(".mp4"));
    }

    #[tokio::test]
    async fn transcodes_once_and_cleans_up() {
        let engine = Arc::new(StubEngine::default());
        let prober = Arc::new(StubProber::returning(1280, 720, 12.5));
        let transcoder = transcoder(Arc::clone(&engine), prober);
        let fractions = Mutex::new(Vec::new());
        let record = |p: crate::processing::video::EngineProgress| fractions.lock().unwrap().push(p.fraction);

        let file = video("holiday.mov", 64);
        let result = transcoder
            .convert_video(&file, &settings(TargetFormat::MP4), 0, &clock(), &record)
            .await
            .unwrap();

        assert_eq!(engine.execs(), 1);
        assert_eq!(engine.file_count(), 0);
        assert_eq!(result.output_name, "holiday.mp4");
        assert_eq!(result.format, "mp4");
        assert_eq!((result.width, result.height), (1280, 720));
        assert_eq!(result.duration_seconds, Some(12.5));
        assert!(result.is_video);
        assert!(!result.requires_server_conversion);
        assert_eq!(*fractions.lock().unwrap(), vec![0.5, 1.0]);
    }

    #[tokio::test]
    async fn exec_failure_falls_back_to_original_bytes() {
        let engine = Arc::new(StubEngine::failing_exec());
        let transcoder = transcoder(Arc::clone(&engine), Arc::new(StubProber::returning(640, 360, 3.0)));

        let file = video("clip.avi", 100);
        let result = transcoder
            .convert_video(&file, &settings(TargetFormat::WebM), 0, &clock(), &silent)
            .await
            .unwrap();

        assert_eq!(engine.execs(), 1);
        assert_eq!(engine.file_count(), 0);
        assert!(result.requires_server_conversion);
        assert_eq!(result.converted_size, result.original_size);
        assert_eq!(result.output_bytes.len(), 100);
        assert_eq!(result.output_name, "clip.webm");
        assert_eq!((result.width, result.height), (640, 360));
        assert_eq!(result.compression_ratio, 0.0);
    }

    #[tokio::test]
    async fn load_failure_is_remembered_for_the_run() {
        let engine = Arc::new(StubEngine::failing_load());
        let transcoder = transcoder(Arc::clone(&engine), Arc::new(StubProber::returning(320, 240, 1.0)));
        let mut run = transcoder.begin_run();
        let s = settings(TargetFormat::MP4);

        for i in 0..3 {
            let result = run.convert(&video("v.mov", 10), &s, i, &clock(), &silent).await.unwrap();
            assert!(result.requires_server_conversion);
        }
        assert!(run.engine_failed());
        assert_eq!(engine.loads(), 1);
        assert_eq!(engine.execs(), 0);

        // A new run may try again.
        transcoder.begin_run().convert(&video("v.mov", 10), &s, 0, &clock(), &silent).await.unwrap();
        assert_eq!(engine.loads(), 2);
    }

    #[tokio::test]
    async fn fallback_without_metadata_is_a_media_read_error() {
        let engine = Arc::new(StubEngine::failing_load());
        let transcoder = transcoder(engine, Arc::new(StubProber::failing()));
        let err = transcoder
            .convert_video(&video("opaque.mp4", 5), &settings(TargetFormat::MP4), 0, &clock(), &silent)
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::MediaRead { ref file, .. } if file == "opaque.mp4"));
    }

    #[tokio::test]
    async fn failed_output_probe_without_source_is_a_media_read_error() {
        let engine = Arc::new(StubEngine::default());
        let prober = Arc::new(StubProber::failing());
        let transcoder = transcoder(Arc::clone(&engine), Arc::clone(&prober));
        let mut s = settings(TargetFormat::MP4);
        s.resize = ResizeSpec { width: Some(640), height: None, aspect_locked: true };

        let err = transcoder
            .convert_video(&video("a.mov", 8), &s, 0, &clock(), &silent)
            .await
            .unwrap_err();
        assert!(matches!(err, ConverterError::MediaRead { .. }));
        assert_eq!(prober.calls.load(Ordering::SeqCst), 2);
        assert_eq!(engine.file_count(), 0);
    }
}
