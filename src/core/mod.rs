//! Core application types and state management.
//!
//! - [`AppState`]: shared state built from the configuration
//! - [`MediaFile`]: an input selected for conversion
//! - [`ConversionSettings`]: settings for one batch run
//! - [`ConversionResult`], [`FileOutcome`], [`BatchSummary`]: conversion outcomes
//! - [`Progress`]: progress events for batch operations

mod media;
mod progress;
mod state;
mod types;

pub use media::MediaFile;
pub use progress::{NoProgress, Progress, ProgressSink, ProgressType, percentage};
pub use state::AppState;
pub use types::{
    BatchSummary, ConversionResult, ConversionSettings, FileOutcome, FilterSpec, ResizeSpec,
    compression_ratio,
};
