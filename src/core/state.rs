//! Application state shared by the command handlers.

use std::sync::Arc;
use tracing::debug;

use crate::config::AppConfig;
use crate::download::DownloadClient;
use crate::processing::batch::BatchOrchestrator;
use crate::processing::video::{EngineSlot, EngineStatus, FfprobeProber, VideoTranscoder};
use crate::utils::ConverterResult;

/// Application state built once at startup.
///
/// Cheap to clone; every clone shares the orchestrator, so the single-batch
/// rule holds across all of them.
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    engine: Arc<EngineSlot>,
    orchestrator: Arc<BatchOrchestrator>,
    downloads: DownloadClient,
}

impl AppState {
    /// Wires the shared engine slot, ffprobe and the backend client from `config`.
    ///
    /// The engine itself is not loaded here; the first video does that.
    pub fn new(config: AppConfig) -> ConverterResult<Self> {
        let engine = EngineSlot::shared(&config);
        let prober = Arc::new(FfprobeProber::new(config.ffprobe_path.clone()));
        let orchestrator = BatchOrchestrator::new(VideoTranscoder::new(Arc::clone(&engine), prober));
        let downloads = DownloadClient::new(&config.backend_url)?;
        debug!("AppState initialized (backend: {})", downloads.base_url());

        Ok(Self {
            config: Arc::new(config),
            engine,
            orchestrator: Arc::new(orchestrator),
            downloads,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    pub fn downloads(&self) -> &DownloadClient {
        &self.downloads
    }

    pub fn engine_status(&self) -> EngineStatus {
        self.engine.status()
    }
}
