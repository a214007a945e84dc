//! Commands that talk to the download backend.

use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::AppState;
use crate::download::{DownloadTicket, MediaInfo, Platform, parse_media_url};
use crate::utils::ConverterResult;

/// Metadata lookup for a pasted link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoOutput {
    pub platform: Platform,
    pub id: String,
    pub info: MediaInfo,
}

/// A prepared download, optionally fetched to disk.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOutput {
    pub platform: Platform,
    pub id: String,
    pub ticket: DownloadTicket,
    pub url: String,
    pub saved_to: Option<PathBuf>,
}

pub async fn media_info(state: &AppState, link: &str) -> ConverterResult<InfoOutput> {
    let (platform, id) = parse_media_url(link)?;
    debug!("Received info command for {} id {}", platform, id);
    let info = state.downloads().fetch_info(platform, &id).await?;
    Ok(InfoOutput { platform, id, info })
}

/// Asks the backend to prepare `link`, then saves the file into `save_dir`
/// when one is given.
pub async fn download_media(
    state: &AppState,
    link: &str,
    quality: &str,
    format: &str,
    save_dir: Option<&Path>,
) -> ConverterResult<DownloadOutput> {
    let (platform, id) = parse_media_url(link)?;
    let client = state.downloads();

    let ticket = client.request_download(platform, &id, quality, format).await?;
    let url = client.resolve_download_url(&ticket)?.to_string();
    info!("{} ready at {}", ticket.filename, url);

    let saved_to = match save_dir {
        Some(dir) => Some(client.save(&ticket, dir).await?),
        None => None,
    };

    Ok(DownloadOutput { platform, id, ticket, url, saved_to })
}
