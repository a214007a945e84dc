use std::path::{Path, PathBuf};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::utils::{ConverterError, ConverterResult, unique_output_path};
use super::urls::Platform;

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// `data` of a successful response, otherwise a `Backend` error.
    pub fn into_result(self) -> ConverterResult<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ConverterError::Backend("response has no data".to_string())),
            (false, _) => Err(ConverterError::Backend(
                self.error.unwrap_or_else(|| "request failed".to_string()),
            )),
        }
    }
}

/// Metadata of a remote video or post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub available_formats: Vec<String>,
}

/// A file prepared by the backend and ready to fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadTicket {
    pub filename: String,
    pub download_url: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
struct DownloadRequest<'a> {
    id: &'a str,
    quality: &'a str,
    format: &'a str,
}

/// HTTP client for the download backend.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: Client,
    base: Url,
}

impl DownloadClient {
    pub fn new(backend_url: &str) -> ConverterResult<Self> {
        let mut base = Url::parse(backend_url)
            .map_err(|e| ConverterError::config(format!("invalid backend url '{backend_url}': {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(concat!("media-converter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConverterError::config(format!("failed to build http client: {e}")))?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ConverterResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ConverterError::config(format!("invalid endpoint '{path}': {e}")))
    }

    /// `GET api/<platform>/info/<id>`
    pub async fn fetch_info(&self, platform: Platform, id: &str) -> ConverterResult<MediaInfo> {
        let url = self.endpoint(&format!("api/{}/info/{id}", platform.api_segment()))?;
        debug!("Fetching {} info for {}", platform, id);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        parse_envelope(status, &body)
    }

    /// `POST api/<platform>/download` with `{ id, quality, format }`.
    pub async fn request_download(
        &self,
        platform: Platform,
        id: &str,
        quality: &str,
        format: &str,
    ) -> ConverterResult<DownloadTicket> {
        let url = self.endpoint(&format!("api/{}/download", platform.api_segment()))?;
        debug!("Requesting {} download of {} ({}, {})", platform, id, quality, format);
        let response = self
            .client
            .post(url)
            .json(&DownloadRequest { id, quality, format })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        parse_envelope(status, &body)
    }

    /// Absolute URL of a ticket; relative `download_url`s resolve against the backend.
    pub fn resolve_download_url(&self, ticket: &DownloadTicket) -> ConverterResult<Url> {
        self.base
            .join(&ticket.download_url)
            .map_err(|e| ConverterError::Backend(format!("invalid download url: {e}")))
    }

    /// Fetches a prepared file into `dir` without overwriting existing files.
    pub async fn save(&self, ticket: &DownloadTicket, dir: &Path) -> ConverterResult<PathBuf> {
        let url = self.resolve_download_url(ticket)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConverterError::Backend(format!("download failed: status={status}")));
        }
        let bytes = response.bytes().await?;

        let name = Path::new(&ticket.filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("download");
        tokio::fs::create_dir_all(dir).await?;
        let path = unique_output_path(dir, name);
        tokio::fs::write(&path, &bytes).await?;
        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Decodes an [`ApiResponse`] body, mapping HTTP failures without an
/// envelope to `Backend` errors.
pub fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> ConverterResult<T> {
    match serde_json::from_str::<ApiResponse<T>>(body) {
        Ok(envelope) => envelope.into_result(),
        Err(_) if !status.is_success() => {
            Err(ConverterError::Backend(format!("status={status} body={}", body.trim())))
        }
        Err(e) => Err(ConverterError::Backend(format!("unreadable response: {e}"))),
    }
}
