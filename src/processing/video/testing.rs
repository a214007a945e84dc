//! In-memory engine and prober used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::utils::{ConverterError, ConverterResult};
use super::engine::{EngineProgress, EngineProgressFn, TranscodeEngine};
use super::probe::{MediaProber, VideoMetadata};

/// Engine whose `exec` copies the `-i` input to the last argument.
#[derive(Default)]
pub struct StubEngine {
    pub fail_load: bool,
    pub fail_exec: bool,
    pub load_delay: Duration,
    pub loads: AtomicUsize,
    pub execs: AtomicUsize,
    pub files: Mutex<HashMap<String, Vec<u8>>>,
}

impl StubEngine {
    pub fn failing_load() -> Self {
        Self { fail_load: true, ..Default::default() }
    }

    pub fn failing_exec() -> Self {
        Self { fail_exec: true, ..Default::default() }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn execs(&self) -> usize {
        self.execs.load(Ordering::SeqCst)
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl TranscodeEngine for StubEngine {
    async fn load(&self) -> ConverterResult<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        if self.fail_load {
            return Err(ConverterError::engine_load("stub engine refused to load"));
        }
        Ok(())
    }

    async fn write_input(&self, name: &str, data: &[u8]) -> ConverterResult<()> {
        self.files.lock().unwrap().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn exec(&self, args: &[String], progress: EngineProgressFn<'_>) -> ConverterResult<()> {
        self.execs.fetch_add(1, Ordering::SeqCst);
        if self.fail_exec {
            return Err(ConverterError::transcode("stub exec failure"));
        }
        let input = args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| args.get(i + 1))
            .ok_or_else(|| ConverterError::transcode("no input argument"))?;
        let output = args.last().ok_or_else(|| ConverterError::transcode("no output argument"))?;

        progress(EngineProgress { fraction: 0.5, elapsed: Duration::from_millis(1) });
        let mut files = self.files.lock().unwrap();
        let data = files
            .get(input)
            .cloned()
            .ok_or_else(|| ConverterError::transcode(format!("missing input {input}")))?;
        files.insert(output.clone(), data);
        progress(EngineProgress { fraction: 1.0, elapsed: Duration::from_millis(2) });
        Ok(())
    }

    async fn read_output(&self, name: &str) -> ConverterResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ConverterError::transcode(format!("missing output '{name}'")))
    }

    async fn delete_file(&self, name: &str) -> ConverterResult<()> {
        self.files.lock().unwrap().remove(name);
        Ok(())
    }
}

/// Prober returning fixed metadata, or failing for every input.
pub struct StubProber {
    pub metadata: Option<VideoMetadata>,
    pub calls: AtomicUsize,
}

impl StubProber {
    pub fn returning(width: u32, height: u32, duration_seconds: f64) -> Self {
        Self {
            metadata: Some(VideoMetadata { width, height, duration_seconds: Some(duration_seconds) }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self { metadata: None, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl MediaProber for StubProber {
    async fn probe(&self, name: &str, _data: &[u8]) -> ConverterResult<VideoMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.metadata
            .ok_or_else(|| ConverterError::media_read(name, "stub prober cannot read media"))
    }
}
