//! Error types for the media converter.
//!
//! Per-file errors (`Decode`, `Encode`, `MediaRead`) are caught by the batch
//! orchestrator and counted. `UnsupportedInput`, `AlreadyRunning` and setup
//! errors abort a run before it starts.

use std::io;
use serde::Serialize;
use thiserror::Error;

/// Main error type for the converter library.
#[derive(Error, Debug, Serialize)]
pub enum ConverterError {
    /// File is neither an image nor a video
    #[error("Unsupported input '{file}': {mime}")]
    UnsupportedInput { file: String, mime: String },

    /// Image bytes could not be decoded
    #[error("Failed to decode '{file}': {reason}")]
    Decode { file: String, reason: String },

    /// Output surface could not be encoded
    #[error("Failed to encode '{file}': {reason}")]
    Encode { file: String, reason: String },

    /// The transcoding engine ran but did not produce output
    #[error("Transcode failed: {0}")]
    Transcode(String),

    /// Dimensions/duration could not be probed, even on the fallback path
    #[error("Cannot read media metadata for '{file}': {reason}")]
    MediaRead { file: String, reason: String },

    /// The transcoding engine failed to initialize
    #[error("Transcoding engine failed to load: {0}")]
    EngineLoad(String),

    /// A batch was requested while another one is running
    #[error("Conversion already in progress")]
    AlreadyRunning,

    /// Settings or inputs rejected before processing
    #[error("Validation error: {0}")]
    Validation(String),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),

    /// Download backend could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Download backend answered with `success: false`
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience result type for converter operations.
pub type ConverterResult<T> = Result<T, ConverterError>;

// Helper methods for error creation
impl ConverterError {
    pub fn decode(file: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode { file: file.into(), reason: reason.to_string() }
    }

    pub fn encode(file: impl Into<String>, reason: impl ToString) -> Self {
        Self::Encode { file: file.into(), reason: reason.to_string() }
    }

    pub fn media_read(file: impl Into<String>, reason: impl ToString) -> Self {
        Self::MediaRead { file: file.into(), reason: reason.to_string() }
    }

    pub fn transcode<T: Into<String>>(msg: T) -> Self {
        Self::Transcode(msg.into())
    }

    pub fn engine_load<T: Into<String>>(msg: T) -> Self {
        Self::EngineLoad(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        Self::IO(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }
}

// Convert std::io::Error to ConverterError
impl From<io::Error> for ConverterError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

impl From<reqwest::Error> for ConverterError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
