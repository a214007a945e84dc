use serde::{Deserialize, Serialize};

/// Progress message type
#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ProgressType {
    Start,
    Progress,
    /// Relayed from the transcoding engine while a video is converting
    Transcoding,
    Complete,
    Error,
}

/// Unified progress struct for batch conversion events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Progress type (start, progress, transcoding, complete, error)
    pub progress_type: ProgressType,
    /// Number of completed files
    pub completed_tasks: usize,
    /// Total number of files
    pub total_tasks: usize,
    /// Progress percentage (0-100)
    pub progress_percentage: f64,
    /// Current status message
    pub status: String,
    /// File the event refers to, if any
    #[serde(default)]
    pub file_name: Option<String>,
    /// Optional error message
    #[serde(default)]
    pub error: Option<String>,
    /// Optional additional metadata
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl Progress {
    /// Create a new Progress instance with basic information
    pub fn new(
        progress_type: ProgressType,
        completed_tasks: usize,
        total_tasks: usize,
        status: impl Into<String>,
    ) -> Self {
        Self {
            progress_type,
            completed_tasks,
            total_tasks,
            progress_percentage: percentage(completed_tasks, total_tasks),
            status: status.into(),
            file_name: None,
            error: None,
            metadata: None,
        }
    }

    pub fn with_file(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// `completed / total * 100`, 0 for an empty batch.
pub fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

/// Receives progress events from a running batch.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Send + Sync,
{
    fn report(&self, progress: Progress) {
        self(progress)
    }
}

/// Discards every event.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: Progress) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_of_batch() {
        assert_eq!(Progress::new(ProgressType::Progress, 1, 4, "x").progress_percentage, 25.0);
        assert_eq!(Progress::new(ProgressType::Start, 0, 0, "x").progress_percentage, 0.0);
    }

    #[test]
    fn serializes_camel_case() {
        let progress = Progress::new(ProgressType::Complete, 2, 2, "complete").with_file("a.png");
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["progressType"], "complete");
        assert_eq!(json["completedTasks"], 2);
        assert_eq!(json["fileName"], "a.png");
    }
}
