use serde::{Deserialize, Serialize};

/// A labelled point in wall-clock time (UNIX seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub time: f64,
}

impl Chapter {
    pub fn new(title: impl Into<String>, time: f64) -> Self {
        Self {
            title: title.into(),
            time,
        }
    }
}

/// Everything known about one recording, persisted as a JSON sidecar next to
/// the video while it is being captured and after it is processed.
///
/// `start_time` and `end_time` are only filled in by post-processing, from
/// the file's modification time and probed duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
    /// Game/category changes in the order they were observed.
    #[serde(default)]
    pub categories: Vec<Chapter>,
    /// Stream title changes in the order they were observed.
    #[serde(default)]
    pub titles: Vec<Chapter>,
}
