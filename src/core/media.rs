//! Input media file definition.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::utils::{ConverterError, ConverterResult, mime_from_extension};

#[derive(Clone)]
enum Content {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

/// A file selected for conversion.
///
/// Immutable once created. Bytes either live in memory or are read from disk
/// on demand through [`MediaFile::read_bytes`].
#[derive(Clone)]
pub struct MediaFile {
    name: String,
    size: u64,
    mime_type: Option<String>,
    content: Content,
}

impl MediaFile {
    /// Creates an in-memory file.
    pub fn new(name: impl Into<String>, mime_type: Option<String>, data: impl Into<Arc<[u8]>>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            mime_type: mime_type.filter(|m| !m.trim().is_empty()),
            content: Content::Memory(data),
        }
    }

    /// References a file on disk; only its metadata is read here.
    pub async fn from_path(path: impl AsRef<Path>) -> ConverterResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            ConverterError::io(format!("Cannot read '{}': {e}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(ConverterError::validation(format!(
                "Input path is not a file: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed")
            .to_string();

        Ok(Self {
            mime_type: mime_from_extension(&name).map(str::to_string),
            name,
            size: metadata.len(),
            content: Content::Disk(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Returns the raw bytes, reading them from disk if needed.
    pub async fn read_bytes(&self) -> ConverterResult<Arc<[u8]>> {
        match &self.content {
            Content::Memory(data) => Ok(Arc::clone(data)),
            Content::Disk(path) => {
                let data = tokio::fs::read(path).await.map_err(|e| {
                    ConverterError::io(format!("Cannot read '{}': {e}", path.display()))
                })?;
                Ok(data.into())
            }
        }
    }
}

impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}
