//! Transcoding engine interface and its ffmpeg implementation.
//!
//! An engine owns a working namespace where inputs are written and outputs
//! read back by name. [`FfmpegEngine`] backs that namespace with a temporary
//! directory created on `load` and runs the `ffmpeg` executable inside it.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::utils::{ConverterError, ConverterResult};

/// Progress reported while `exec` runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineProgress {
    /// 0.0..=1.0 of the input duration
    pub fraction: f64,
    pub elapsed: Duration,
}

/// Callback receiving [`EngineProgress`] events.
pub type EngineProgressFn<'a> = &'a (dyn Fn(EngineProgress) + Send + Sync);

#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// One-time initialization. Called by `EngineSlot`, never concurrently.
    async fn load(&self) -> ConverterResult<()>;

    async fn write_input(&self, name: &str, data: &[u8]) -> ConverterResult<()>;

    /// Runs one transcode with the given argument list.
    async fn exec(&self, args: &[String], progress: EngineProgressFn<'_>) -> ConverterResult<()>;

    async fn read_output(&self, name: &str) -> ConverterResult<Vec<u8>>;

    async fn delete_file(&self, name: &str) -> ConverterResult<()>;
}

/// Engine backed by an external `ffmpeg` executable.
pub struct FfmpegEngine {
    ffmpeg_path: String,
    workdir: OnceLock<TempDir>,
}

impl FfmpegEngine {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            workdir: OnceLock::new(),
        }
    }

    fn workdir(&self) -> ConverterResult<&Path> {
        self.workdir
            .get()
            .map(TempDir::path)
            .ok_or_else(|| ConverterError::engine_load("engine used before load"))
    }

    /// Resolves `name` inside the working directory, refusing path traversal.
    fn entry(&self, name: &str) -> ConverterResult<PathBuf> {
        let relative = Path::new(name);
        let plain = relative.components().count() == 1
            && matches!(relative.components().next(), Some(Component::Normal(_)));
        if !plain {
            return Err(ConverterError::validation(format!("Invalid working file name: {name}")));
        }
        Ok(self.workdir()?.join(relative))
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn load(&self) -> ConverterResult<()> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ConverterError::engine_load(format!("{} not found", self.ffmpeg_path))
                }
                _ => ConverterError::engine_load(e.to_string()),
            })?;

        if !output.status.success() {
            return Err(ConverterError::engine_load(format!(
                "{} -version exited with {:?}",
                self.ffmpeg_path,
                output.status.code()
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        debug!("Transcoding engine: {}", version.lines().next().unwrap_or("ffmpeg"));

        if self.workdir.get().is_none() {
            let dir = tempfile::Builder::new()
                .prefix("media-converter-")
                .tempdir()
                .map_err(|e| ConverterError::engine_load(format!("cannot create working dir: {e}")))?;
            debug!("Engine working directory: {}", dir.path().display());
            // Only EngineSlot calls load, one attempt at a time.
            let _ = self.workdir.set(dir);
        }
        Ok(())
    }

    async fn write_input(&self, name: &str, data: &[u8]) -> ConverterResult<()> {
        let path = self.entry(name)?;
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    async fn exec(&self, args: &[String], progress: EngineProgressFn<'_>) -> ConverterResult<()> {
        let workdir = self.workdir()?;
        let started = Instant::now();

        let mut child = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-nostdin", "-y", "-progress", "pipe:1", "-nostats"])
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConverterError::transcode(format!("failed to start ffmpeg: {e}")))?;

        // Input duration is only announced on stderr.
        let duration_ms = Arc::new(AtomicU64::new(0));
        let stderr_task = child.stderr.take().map(|mut stderr| {
            let duration_ms = Arc::clone(&duration_ms);
            tokio::spawn(async move {
                let mut text = String::new();
                let mut chunk = [0u8; 4096];
                loop {
                    match stderr.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            text.push_str(&String::from_utf8_lossy(&chunk[..n]));
                            if duration_ms.load(Ordering::Relaxed) == 0 {
                                if let Some(ms) = parse_duration_banner(&text) {
                                    duration_ms.store(ms, Ordering::Relaxed);
                                }
                            }
                        }
                    }
                }
                text
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let total = duration_ms.load(Ordering::Relaxed);
                if let Some(fraction) = parse_progress_line(&line, total) {
                    progress(EngineProgress { fraction, elapsed: started.elapsed() });
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ConverterError::transcode(format!("ffmpeg did not exit cleanly: {e}")))?;
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            return Err(ConverterError::transcode(format!(
                "ffmpeg exited with {:?}: {}",
                status.code(),
                tail.join(" | ")
            )));
        }

        progress(EngineProgress { fraction: 1.0, elapsed: started.elapsed() });
        Ok(())
    }

    async fn read_output(&self, name: &str) -> ConverterResult<Vec<u8>> {
        let path = self.entry(name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| ConverterError::transcode(format!("missing output '{name}': {e}")))
    }

    async fn delete_file(&self, name: &str) -> ConverterResult<()> {
        let path = self.entry(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Working file '{}' already gone", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Extracts `Duration: HH:MM:SS.xx` from ffmpeg's stderr banner, in millis.
fn parse_duration_banner(text: &str) -> Option<u64> {
    let start = text.find("Duration: ")? + "Duration: ".len();
    let stamp = text[start..].split(',').next()?.trim();
    parse_timestamp_ms(stamp)
}

fn parse_timestamp_ms(stamp: &str) -> Option<u64> {
    let mut parts = stamp.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    let total = (hours * 3600.0 + minutes * 60.0 + seconds) * 1000.0;
    (total.is_finite() && total > 0.0).then(|| total.round() as u64)
}

/// Turns a `-progress` key/value line into a fraction of `total_ms`.
///
/// `out_time_ms` is reported in microseconds despite its name.
fn parse_progress_line(line: &str, total_ms: u64) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_ms" | "out_time_us" if total_ms > 0 => {
            let micros: f64 = value.trim().parse().ok()?;
            Some((micros / 1000.0 / total_ms as f64).clamp(0.0, 1.0))
        }
        "progress" if value.trim() == "end" => Some(1.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_banner() {
        let banner = "Input #0, mov,mp4,m4a, from 'in.mp4':\n  Duration: 00:01:02.50, start: 0.000000, bitrate: 1205 kb/s\n";
        assert_eq!(parse_duration_banner(banner), Some(62_500));
        assert_eq!(parse_duration_banner("Duration: N/A, bitrate: N/A"), None);
    }

    #[test]
    fn progress_lines_become_fractions() {
        assert_eq!(parse_progress_line("out_time_ms=5000000", 10_000), Some(0.5));
        assert_eq!(parse_progress_line("out_time_ms=5000000", 0), None);
        assert_eq!(parse_progress_line("progress=end", 0), Some(1.0));
        assert_eq!(parse_progress_line("progress=continue", 10), None);
        assert_eq!(parse_progress_line("frame=12", 10), None);
    }

    #[tokio::test]
    async fn entries_reject_traversal_and_require_load() {
        let engine = FfmpegEngine::new("ffmpeg");
        assert!(matches!(engine.entry("input.mp4"), Err(ConverterError::EngineLoad(_))));

        let dir = tempfile::tempdir().unwrap();
        let _ = engine.workdir.set(dir);
        assert!(engine.entry("input_1.mp4").is_ok());
        assert!(engine.entry("../escape.mp4").is_err());
        assert!(engine.entry("nested/input.mp4").is_err());

        engine.write_input("input_1.mp4", b"abc").await.unwrap();
        assert_eq!(engine.read_output("input_1.mp4").await.unwrap(), b"abc");
        engine.delete_file("input_1.mp4").await.unwrap();
        engine.delete_file("input_1.mp4").await.unwrap();
    }

    #[tokio::test]
    async fn missing_binary_fails_to_load() {
        let engine = FfmpegEngine::new("/nonexistent/bin/ffmpeg-for-tests");
        let err = engine.load().await.unwrap_err();
        assert!(matches!(err, ConverterError::EngineLoad(_)));
    }
}
