//! Client side of the download backend.
//!
//! The backend fetches YouTube and Instagram media with its own tools; this
//! module only extracts ids from links and talks to its JSON API.

mod client;
mod urls;

pub use client::{ApiResponse, DownloadClient, DownloadTicket, MediaInfo, parse_envelope};
pub use urls::{Platform, extract_instagram_shortcode, extract_youtube_id, parse_media_url};
