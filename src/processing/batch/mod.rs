mod cancel;
mod processor;

pub use cancel::CancellationFlag;
pub use processor::{BatchOrchestrator, BatchState};
