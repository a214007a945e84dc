// Module declarations in dependency order
pub mod utils;
pub mod config;
pub mod core;
pub mod processing;
pub mod report;
pub mod download;
pub mod commands;

// Public exports for external consumers
pub use config::AppConfig;
pub use crate::core::{AppState, BatchSummary, ConversionResult, ConversionSettings, MediaFile, Progress};
pub use processing::batch::{BatchOrchestrator, CancellationFlag};
pub use utils::{ConverterError, ConverterResult, TargetFormat};
pub use commands::*;

// This library file is the public API of the crate.
// The command-line entry point is in main.rs.
