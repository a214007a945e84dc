//! Codec argument lists per target container.

use crate::core::ResizeSpec;
use crate::utils::TargetFormat;

const AUDIO_BITRATE: &str = "128k";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Quality factor on a `0..=max` scale where lower is better.
fn inverse_scale(quality: f32, max: f32) -> i32 {
    (max - quality.clamp(0.0, 1.0) * max).round() as i32
}

/// Encoder arguments for `target` at `quality` (0.0..=1.0), plus a scale
/// filter when `resize` sets a dimension.
pub fn build_codec_args(target: TargetFormat, quality: f32, resize: &ResizeSpec) -> Vec<String> {
    let q = quality.clamp(0.0, 1.0);
    let mut args = match target {
        TargetFormat::MP4 | TargetFormat::MOV => {
            let crf = inverse_scale(q, 51.0).to_string();
            let mut args = strings(&["-c:v", "libx264", "-crf", crf.as_str(), "-c:a", "aac", "-b:a", AUDIO_BITRATE]);
            if target == TargetFormat::MOV {
                args.extend(strings(&["-movflags", "+faststart"]));
            }
            args
        }
        TargetFormat::WebM => {
            let crf = inverse_scale(q, 63.0).to_string();
            strings(&[
                "-c:v", "libvpx-vp9", "-crf", crf.as_str(), "-b:v", "0",
                "-c:a", "libopus", "-b:a", AUDIO_BITRATE,
            ])
        }
        TargetFormat::AVI => {
            let qscale = ((31.0 - q * 29.0).round() as i32).to_string();
            strings(&["-c:v", "mpeg4", "-q:v", qscale.as_str(), "-c:a", "libmp3lame", "-b:a", AUDIO_BITRATE])
        }
        _ => strings(&["-c:v", "libx264", "-c:a", "aac"]),
    };

    if let Some(filter) = scale_filter(resize) {
        args.push("-vf".to_string());
        args.push(filter);
    }
    args
}

/// `scale=W:H`, with `-2` standing in for a missing dimension so ffmpeg keeps
/// the aspect ratio at an even size.
pub fn scale_filter(resize: &ResizeSpec) -> Option<String> {
    if !resize.is_set() {
        return None;
    }
    let dim = |d: Option<u32>| d.map(|v| v.to_string()).unwrap_or_else(|| "-2".to_string());
    Some(format!("scale={}:{}", dim(resize.width), dim(resize.height)))
}

/// Full argument list for one transcode inside the engine's namespace.
pub fn transcode_args(input: &str, output: &str, codec_args: Vec<String>) -> Vec<String> {
    let mut args: Vec<String> = Vec::with_capacity(codec_args.len() + 3);
    args.extend(["-i".to_string(), input.to_string()]);
    args.extend(codec_args);
    args.push(output.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_resize() -> ResizeSpec {
        ResizeSpec::default()
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter().position(|a| a == flag).map(|i| args[i + 1].as_str())
    }

    #[test]
    fn mp4_uses_h264_with_crf() {
        let args = build_codec_args(TargetFormat::MP4, 0.8, &no_resize());
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-crf"), Some("10"));
        assert_eq!(value_after(&args, "-c:a"), Some("aac"));
        assert_eq!(value_after(&args, "-b:a"), Some("128k"));
        assert!(!args.contains(&"-movflags".to_string()));
    }

    #[test]
    fn mov_adds_faststart() {
        let args = build_codec_args(TargetFormat::MOV, 0.5, &no_resize());
        assert_eq!(value_after(&args, "-crf"), Some("26"));
        assert_eq!(value_after(&args, "-movflags"), Some("+faststart"));
    }

    #[test]
    fn webm_is_constant_quality_vp9() {
        let args = build_codec_args(TargetFormat::WebM, 1.0, &no_resize());
        assert_eq!(value_after(&args, "-c:v"), Some("libvpx-vp9"));
        assert_eq!(value_after(&args, "-crf"), Some("0"));
        assert_eq!(value_after(&args, "-b:v"), Some("0"));
        assert_eq!(value_after(&args, "-c:a"), Some("libopus"));
    }

    #[test]
    fn avi_uses_mpeg4_qscale() {
        let args = build_codec_args(TargetFormat::AVI, 0.0, &no_resize());
        assert_eq!(value_after(&args, "-c:v"), Some("mpeg4"));
        assert_eq!(value_after(&args, "-q:v"), Some("31"));
        assert_eq!(value_after(&args, "-c:a"), Some("libmp3lame"));
        let args = build_codec_args(TargetFormat::AVI, 1.0, &no_resize());
        assert_eq!(value_after(&args, "-q:v"), Some("2"));
    }

    #[test]
    fn unrecognized_target_has_no_quality_tuning() {
        let args = build_codec_args(TargetFormat::GIF, 0.3, &no_resize());
        assert_eq!(args, ["-c:v", "libx264", "-c:a", "aac"]);
    }

    #[test]
    fn resize_appends_scale_filter() {
        let resize = ResizeSpec { width: Some(1280), height: None, aspect_locked: true };
        let args = build_codec_args(TargetFormat::MP4, 0.5, &resize);
        assert_eq!(value_after(&args, "-vf"), Some("scale=1280:-2"));

        let resize = ResizeSpec { width: None, height: Some(720), aspect_locked: false };
        assert_eq!(scale_filter(&resize).as_deref(), Some("scale=-2:720"));
        assert_eq!(scale_filter(&no_resize()), None);
    }

    #[test]
    fn full_argument_order() {
        let args = transcode_args("in.mov", "out.mp4", strings(&["-c:v", "libx264"]));
        assert_eq!(args, ["-i", "in.mov", "-c:v", "libx264", "out.mp4"]);
    }
}
