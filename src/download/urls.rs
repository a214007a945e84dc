//! Media id extraction from YouTube and Instagram links.

use std::fmt;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::{ConverterError, ConverterResult};

/// Platforms the download backend knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    Instagram,
}

impl Platform {
    /// Path segment used by the backend API.
    pub fn api_segment(&self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YouTube => write!(f, "YouTube"),
            Self::Instagram => write!(f, "Instagram"),
        }
    }
}

fn host_of(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(&host)
        .to_string();
    Some(host)
}

fn parse(input: &str) -> Option<Url> {
    let input = input.trim();
    Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .ok()
}

fn is_youtube_id(id: &str) -> bool {
    id.len() == 11 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_shortcode(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Video id from `watch?v=`, `youtu.be/`, `shorts/` and `embed/` links.
pub fn extract_youtube_id(input: &str) -> Option<String> {
    let url = parse(input)?;
    let host = host_of(&url)?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let id = match host.as_str() {
        "youtu.be" => segments.next()?.to_string(),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())?,
            "shorts" | "embed" => segments.next()?.to_string(),
            _ => return None,
        },
        _ => return None,
    };

    is_youtube_id(&id).then_some(id)
}

/// Post shortcode from `/p/`, `/reel/` and `/tv/` links.
pub fn extract_instagram_shortcode(input: &str) -> Option<String> {
    let url = parse(input)?;
    if host_of(&url)? != "instagram.com" {
        return None;
    }
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    match segments.next()? {
        "p" | "reel" | "reels" | "tv" => {
            let code = segments.next()?;
            is_shortcode(code).then(|| code.to_string())
        }
        _ => None,
    }
}

/// Detects the platform of `input` and extracts its media id.
pub fn parse_media_url(input: &str) -> ConverterResult<(Platform, String)> {
    if let Some(id) = extract_youtube_id(input) {
        return Ok((Platform::YouTube, id));
    }
    if let Some(code) = extract_instagram_shortcode(input) {
        return Ok((Platform::Instagram, code));
    }
    Err(ConverterError::validation(format!(
        "Not a supported YouTube or Instagram link: {input}"
    )))
}
