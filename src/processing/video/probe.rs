//! Video metadata probing via ffprobe.

use std::process::Stdio;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::utils::{ConverterError, ConverterResult, extension_of};

/// Dimensions and duration of a video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub duration_seconds: Option<f64>,
}

/// Reads [`VideoMetadata`] from raw media bytes.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// `name` is used for the file extension hint and error messages.
    async fn probe(&self, name: &str, data: &[u8]) -> ConverterResult<VideoMetadata>;
}

/// Prober backed by the `ffprobe` executable.
pub struct FfprobeProber {
    ffprobe_path: String,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self { ffprobe_path: ffprobe_path.into() }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, name: &str, data: &[u8]) -> ConverterResult<VideoMetadata> {
        let ext = extension_of(name);
        let suffix = if ext.is_empty() { String::new() } else { format!(".{ext}") };
        let temp = tempfile::Builder::new()
            .prefix("probe-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| ConverterError::media_read(name, e))?;
        tokio::fs::write(temp.path(), data)
            .await
            .map_err(|e| ConverterError::media_read(name, e))?;

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(temp.path())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ConverterError::media_read(name, format!("{} not found", self.ffprobe_path))
                }
                _ => ConverterError::media_read(name, e),
            })?;

        if !output.status.success() {
            return Err(ConverterError::media_read(
                name,
                format!(
                    "ffprobe exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        parse_ffprobe_json(name, &output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    streams: Option<Vec<FfprobeStream>>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Extracts the first video stream's size and the container duration.
pub fn parse_ffprobe_json(name: &str, json: &[u8]) -> ConverterResult<VideoMetadata> {
    let parsed: FfprobeOutput =
        serde_json::from_slice(json).map_err(|e| ConverterError::media_read(name, e))?;

    let stream = parsed
        .streams
        .as_ref()
        .and_then(|s| s.iter().find(|st| st.codec_type.as_deref() == Some("video")))
        .ok_or_else(|| ConverterError::media_read(name, "no video stream"))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(ConverterError::media_read(name, "video stream has no dimensions")),
    };

    let duration_seconds = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(stream.duration.as_deref())
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    Ok(VideoMetadata { width, height, duration_seconds })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_video_stream_and_duration() {
        let json = br#"{
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080, "duration": "9.9"}
            ],
            "format": {"format_name": "mov,mp4,m4a", "duration": "10.010000"}
        }"#;
        let meta = parse_ffprobe_json("clip.mp4", json).unwrap();
        assert_eq!((meta.width, meta.height), (1920, 1080));
        assert_eq!(meta.duration_seconds, Some(10.01));
    }

    #[test]
    fn stream_duration_is_a_fallback() {
        let json = br#"{"streams": [{"codec_type": "video", "width": 64, "height": 48, "duration": "2.5"}]}"#;
        assert_eq!(parse_ffprobe_json("a.webm", json).unwrap().duration_seconds, Some(2.5));
    }

    #[test]
    fn audio_only_is_a_media_read_error() {
        let json = br#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        let err = parse_ffprobe_json("song.mp4", json).unwrap_err();
        assert!(matches!(err, ConverterError::MediaRead { ref file, .. } if file == "song.mp4"));
    }

    #[tokio::test]
    async fn missing_ffprobe_is_a_media_read_error() {
        let prober = FfprobeProber::new("/nonexistent/bin/ffprobe-for-tests");
        let err = prober.probe("clip.mp4", b"data").await.unwrap_err();
        assert!(matches!(err, ConverterError::MediaRead { .. }));
    }
}
