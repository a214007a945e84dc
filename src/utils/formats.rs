use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use crate::core::MediaFile;
use crate::utils::{ConverterError, ConverterResult};

/// Output formats a batch can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    WebP,
    PNG,
    JPEG,
    GIF,
    BMP,
    MP4,
    WebM,
    AVI,
    MOV,
}

impl TargetFormat {
    pub const IMAGE_FORMATS: [TargetFormat; 5] =
        [Self::WebP, Self::PNG, Self::JPEG, Self::GIF, Self::BMP];
    pub const VIDEO_FORMATS: [TargetFormat; 4] = [Self::MP4, Self::WebM, Self::AVI, Self::MOV];

    /// Canonical lowercase identifier, also used as the file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::PNG => "png",
            Self::JPEG => "jpeg",
            Self::GIF => "gif",
            Self::BMP => "bmp",
            Self::MP4 => "mp4",
            Self::WebM => "webm",
            Self::AVI => "avi",
            Self::MOV => "mov",
        }
    }

    pub fn is_video(&self) -> bool {
        Self::VIDEO_FORMATS.contains(self)
    }

    pub fn is_image(&self) -> bool {
        !self.is_video()
    }

    /// Whether the quality setting influences the encoder.
    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::JPEG | Self::WebP) || self.is_video()
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "webp" => Ok(Self::WebP),
            "png" => Ok(Self::PNG),
            "jpg" | "jpeg" => Ok(Self::JPEG),
            "gif" => Ok(Self::GIF),
            "bmp" => Ok(Self::BMP),
            "mp4" => Ok(Self::MP4),
            "webm" => Ok(Self::WebM),
            "avi" => Ok(Self::AVI),
            "mov" => Ok(Self::MOV),
            other => Err(ConverterError::validation(format!(
                "Unsupported target format: {other}"
            ))),
        }
    }
}

/// Broad media category used to pick a conversion stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "gif", "bmp", "svg", "tif", "tiff", "ico", "avif",
];
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "webm", "avi", "mov", "mkv", "m4v", "wmv", "flv", "mpeg", "mpg", "3gp",
];

impl MediaKind {
    /// Classifies a file by MIME category, falling back to its extension.
    pub fn classify(file: &MediaFile) -> ConverterResult<Self> {
        if let Some(mime) = file.mime_type() {
            let top = mime.split('/').next().unwrap_or_default().to_lowercase();
            match top.as_str() {
                "image" => return Ok(Self::Image),
                "video" => return Ok(Self::Video),
                _ => {}
            }
        }

        let ext = extension_of(file.name());
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Video)
        } else {
            Err(ConverterError::UnsupportedInput {
                file: file.name().to_string(),
                mime: file.mime_type().unwrap_or("unknown").to_string(),
            })
        }
    }
}

/// Lower-cased extension of `name`, or an empty string.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// File name without its final extension.
pub fn stem_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    }
}

fn alias_subtype(subtype: &str) -> &str {
    match subtype {
        "svg+xml" => "svg",
        "x-ms-wmv" => "wmv",
        "quicktime" => "mov",
        other => other,
    }
}

/// Derives a canonical lowercase format identifier for `file`.
///
/// The MIME subtype wins when present; `image/jpeg` stays `jpeg`. Falls back
/// to the file extension and finally to `"unknown"`.
pub fn resolve_format(file: &MediaFile) -> String {
    resolve_format_parts(file.mime_type(), file.name())
}

pub fn resolve_format_parts(mime_type: Option<&str>, name: &str) -> String {
    if let Some(subtype) = mime_type
        .and_then(|m| m.split_once('/'))
        .map(|(_, sub)| sub.split(';').next().unwrap_or_default().trim().to_lowercase())
        .filter(|sub| !sub.is_empty())
    {
        return alias_subtype(&subtype).to_string();
    }

    let ext = extension_of(name);
    if ext.is_empty() { "unknown".to_string() } else { ext }
}

/// Output MIME type for an image format id. Unknown ids map to PNG.
pub fn mime_type_for(format_id: &str) -> &'static str {
    match format_id {
        "png" => "image/png",
        "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "image/png",
    }
}

/// Best-effort MIME type guess from a file name, used when reading from disk.
pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let mime = match extension_of(name).as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "wmv" => "video/x-ms-wmv",
        "mpeg" | "mpg" => "video/mpeg",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: Option<&str>) -> MediaFile {
        MediaFile::new(name, mime.map(str::to_string), Vec::new())
    }

    #[test]
    fn mime_subtype_takes_precedence() {
        assert_eq!(resolve_format(&file("photo.png", Some("image/jpeg"))), "jpeg");
        assert_eq!(resolve_format(&file("clip", Some("video/quicktime"))), "mov");
        assert_eq!(resolve_format(&file("logo", Some("image/svg+xml"))), "svg");
        assert_eq!(resolve_format(&file("old", Some("video/x-ms-wmv"))), "wmv");
    }

    #[test]
    fn falls_back_to_extension_then_unknown() {
        assert_eq!(resolve_format(&file("Photo.JPG", None)), "jpg");
        assert_eq!(resolve_format(&file("Photo.WebP", Some(""))), "webp");
        assert_eq!(resolve_format(&file("README", None)), "unknown");
    }

    #[test]
    fn mime_lookup_defaults_to_png() {
        assert_eq!(mime_type_for("jpeg"), "image/jpeg");
        assert_eq!(mime_type_for("bmp"), "image/bmp");
        assert_eq!(mime_type_for("tiff"), "image/png");
    }

    #[test]
    fn classify_by_mime_and_extension() {
        assert_eq!(MediaKind::classify(&file("a", Some("image/png"))).unwrap(), MediaKind::Image);
        assert_eq!(MediaKind::classify(&file("a.mov", None)).unwrap(), MediaKind::Video);
        let err = MediaKind::classify(&file("notes.txt", Some("text/plain"))).unwrap_err();
        assert!(matches!(err, ConverterError::UnsupportedInput { .. }));
    }

    #[test]
    fn target_format_parsing() {
        assert_eq!("jpg".parse::<TargetFormat>().unwrap(), TargetFormat::JPEG);
        assert_eq!("WEBM".parse::<TargetFormat>().unwrap(), TargetFormat::WebM);
        assert!("tga".parse::<TargetFormat>().is_err());
        assert!(TargetFormat::WebP.is_lossy());
        assert!(!TargetFormat::PNG.is_lossy());
        assert!(TargetFormat::AVI.is_video());
    }

    #[test]
    fn stem_keeps_dotfiles() {
        assert_eq!(stem_of("vacation.png"), "vacation");
        assert_eq!(stem_of("archive.tar.gz"), "archive.tar");
        assert_eq!(stem_of(".hidden"), ".hidden");
    }
}
