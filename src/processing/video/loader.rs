//! Lazy, single-flight initialization of the transcoding engine.
//!
//! `Uninitialized → Loading → Ready`, or `Loading → Failed`. Callers arriving
//! while a load is in flight subscribe to its outcome instead of starting a
//! second one. `Ready` is terminal; `Failed` lets the next caller retry.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::utils::{ConverterError, ConverterResult};
use super::engine::{FfmpegEngine, TranscodeEngine};

type LoadOutcome = Option<Result<(), String>>;

const ABANDONED: &str = "engine load was abandoned";

enum Next {
    Wait(watch::Receiver<LoadOutcome>),
    Load(watch::Sender<LoadOutcome>),
}

enum EngineState {
    Uninitialized,
    Loading(watch::Receiver<LoadOutcome>),
    Ready,
    Failed(String),
}

/// Observable snapshot of the slot's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

/// Holds the engine and its load state.
pub struct EngineSlot {
    engine: Arc<dyn TranscodeEngine>,
    state: Mutex<EngineState>,
}

static SHARED: OnceLock<Arc<EngineSlot>> = OnceLock::new();

impl EngineSlot {
    pub fn new(engine: Arc<dyn TranscodeEngine>) -> Self {
        Self {
            engine,
            state: Mutex::new(EngineState::Uninitialized),
        }
    }

    /// Process-wide ffmpeg slot, constructed on first use.
    ///
    /// The first caller's configuration wins; later calls get the same slot.
    pub fn shared(config: &AppConfig) -> Arc<EngineSlot> {
        Arc::clone(SHARED.get_or_init(|| {
            debug!("Creating shared transcoding engine slot ({})", config.ffmpeg_path);
            Arc::new(EngineSlot::new(Arc::new(FfmpegEngine::new(config.ffmpeg_path.clone()))))
        }))
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> EngineStatus {
        match &*self.lock() {
            EngineState::Uninitialized => EngineStatus::Uninitialized,
            EngineState::Loading(_) => EngineStatus::Loading,
            EngineState::Ready => EngineStatus::Ready,
            EngineState::Failed(reason) => EngineStatus::Failed(reason.clone()),
        }
    }

    /// Returns the engine once it is loaded, loading it if necessary.
    pub async fn ensure_ready(&self) -> ConverterResult<Arc<dyn TranscodeEngine>> {
        let next = {
            let mut state = self.lock();
            match &*state {
                EngineState::Ready => return Ok(Arc::clone(&self.engine)),
                EngineState::Loading(rx) => Next::Wait(rx.clone()),
                EngineState::Uninitialized | EngineState::Failed(_) => {
                    let (tx, rx) = watch::channel(None);
                    *state = EngineState::Loading(rx);
                    Next::Load(tx)
                }
            }
        };

        let mut waiting = match next {
            Next::Load(tx) => return self.load(tx).await,
            Next::Wait(rx) => rx,
        };

        debug!("Waiting for in-flight engine load");
        let outcome = match waiting.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or_else(|| Err(ABANDONED.to_string())),
            Err(_) => Err(ABANDONED.to_string()),
        };
        outcome
            .map(|()| Arc::clone(&self.engine))
            .map_err(ConverterError::EngineLoad)
    }

    async fn load(&self, tx: watch::Sender<LoadOutcome>) -> ConverterResult<Arc<dyn TranscodeEngine>> {
        let mut guard = AbandonGuard { slot: self, armed: true };
        info!("Loading transcoding engine");

        let result = self.engine.load().await.map_err(|e| match e {
            ConverterError::EngineLoad(reason) => reason,
            other => other.to_string(),
        });
        guard.armed = false;

        {
            let mut state = self.lock();
            *state = match &result {
                Ok(()) => EngineState::Ready,
                Err(reason) => EngineState::Failed(reason.clone()),
            };
        }
        let _ = tx.send(Some(result.clone()));

        match result {
            Ok(()) => {
                info!("Transcoding engine ready");
                Ok(Arc::clone(&self.engine))
            }
            Err(reason) => {
                warn!("Transcoding engine failed to load: {}", reason);
                Err(ConverterError::EngineLoad(reason))
            }
        }
    }
}

/// Marks the slot failed if a load future is dropped before finishing.
struct AbandonGuard<'a> {
    slot: &'a EngineSlot,
    armed: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.slot.lock() = EngineState::Failed(ABANDONED.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::video::testing::StubEngine;
    use std::time::Duration;

    fn delayed(engine: StubEngine) -> Arc<StubEngine> {
        Arc::new(StubEngine { load_delay: Duration::from_millis(20), ..engine })
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_load() {
        let engine = delayed(StubEngine::default());
        let slot = EngineSlot::new(engine.clone());

        let (a, b, c) = tokio::join!(slot.ensure_ready(), slot.ensure_ready(), slot.ensure_ready());

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(engine.loads(), 1);
        assert_eq!(slot.status(), EngineStatus::Ready);
    }

    #[tokio::test]
    async fn ready_is_terminal() {
        let engine = Arc::new(StubEngine::default());
        let slot = EngineSlot::new(engine.clone());
        slot.ensure_ready().await.unwrap();
        slot.ensure_ready().await.unwrap();
        assert_eq!(engine.loads(), 1);
    }

    #[tokio::test]
    async fn failure_reaches_waiters_and_allows_retry() {
        let engine = delayed(StubEngine::failing_load());
        let slot = EngineSlot::new(engine.clone());
        assert_eq!(slot.status(), EngineStatus::Uninitialized);

        let (a, b) = tokio::join!(slot.ensure_ready(), slot.ensure_ready());
        assert!(matches!(a, Err(ConverterError::EngineLoad(_))));
        assert!(matches!(b, Err(ConverterError::EngineLoad(_))));
        assert_eq!(engine.loads(), 1);
        assert!(matches!(slot.status(), EngineStatus::Failed(_)));

        assert!(slot.ensure_ready().await.is_err());
        assert_eq!(engine.loads(), 2);
    }

    #[tokio::test]
    async fn dropped_load_marks_slot_failed() {
        let engine = Arc::new(StubEngine { load_delay: Duration::from_secs(5), ..Default::default() });
        let slot = EngineSlot::new(engine);

        let timed_out = tokio::time::timeout(Duration::from_millis(10), slot.ensure_ready()).await;
        assert!(timed_out.is_err());
        assert_eq!(slot.status(), EngineStatus::Failed(ABANDONED.to_string()));
    }
}
