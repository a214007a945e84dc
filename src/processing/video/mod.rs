//! Video conversion through an external transcoding engine.
//!
//! [`EngineSlot`] loads the engine lazily and at most once at a time,
//! [`VideoTranscoder`] drives one transcode per file and falls back to the
//! original bytes when the engine cannot help.

mod codecs;
mod engine;
mod loader;
mod probe;
mod transcoder;

#[cfg(test)]
pub(crate) mod testing;

pub use codecs::{build_codec_args, scale_filter, transcode_args};
pub use engine::{EngineProgress, EngineProgressFn, FfmpegEngine, TranscodeEngine};
pub use loader::{EngineSlot, EngineStatus};
pub use probe::{FfprobeProber, MediaProber, VideoMetadata, parse_ffprobe_json};
pub use transcoder::{VideoRun, VideoTranscoder};
