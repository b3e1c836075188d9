use serde::{Deserialize, Serialize};

/// Paths (or bare names resolved against `PATH`) of the external tools.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutablesConfig {
    pub streamlink: String,
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ExecutablesConfig {
    fn default() -> Self {
        Self {
            streamlink: String::from("streamlink"),
            ffmpeg: String::from("ffmpeg"),
            ffprobe: String::from("ffprobe"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub oauth_url: String,
    pub streams_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            oauth_url: String::from("https://id.twitch.tv/oauth2/token"),
            streams_url: String::from("https://api.twitch.tv/helix/streams"),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between liveness checks while idle.
    pub stream_interval_secs: u64,
    /// Delay between metadata refreshes while recording.
    pub metadata_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            stream_interval_secs: 10,
            metadata_interval_secs: 30,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub quality: String,
    pub disable_ads: bool,
    /// A capture process exiting with an error before this many seconds is
    /// treated as a broken setup rather than a failed recording.
    pub startup_grace_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            quality: String::from("best"),
            disable_ads: true,
            startup_grace_secs: 3,
        }
    }
}

/// How category changes are mapped onto chapter marks.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterPolicy {
    /// Ticks per second written as `TIMEBASE=1/<timebase>`.
    pub timebase: u64,
    /// Chapters shorter than this are folded into the next one.
    pub min_chapter_secs: f64,
}

impl Default for ChapterPolicy {
    fn default() -> Self {
        Self {
            timebase: 1000,
            min_chapter_secs: 0.0,
        }
    }
}
