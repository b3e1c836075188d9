use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, error, info};

use crate::error_handling::types::StorageError;
use crate::storage::types::RecordingMetadata;
use crate::twitch_api::types::StreamRecord;

const VIDEO_EXTENSION: &str = "mp4";
const SIDECAR_EXTENSION: &str = "json";

/// Filesystem layout of one broadcaster's recordings.
///
/// ```text
/// <storage_dir>/recorded/<username>/<stem>.mp4    raw capture, still growing or unprocessed
/// <storage_dir>/recorded/<username>/<stem>.json   metadata sidecar
/// <storage_dir>/processed/<username>/<stem>.mp4   tagged final file
/// <storage_dir>/processed/<username>/<stem>.json  final metadata
/// ```
#[derive(Debug, Clone)]
pub struct RecordingStore {
    recorded_dir: PathBuf,
    processed_dir: PathBuf,
}

impl RecordingStore {
    /// Creates the store and both directories if they are missing.
    pub fn new<P: AsRef<Path>>(storage_dir: P, username: &str) -> Result<Self, StorageError> {
        let storage_dir = storage_dir.as_ref();
        let recorded_dir = storage_dir.join("recorded").join(username);
        let processed_dir = storage_dir.join("processed").join(username);

        for dir in [&recorded_dir, &processed_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create directory {}: {}", dir.display(), e);
                StorageError::WriteFailed(format!("{}: {}", dir.display(), e))
            })?;
        }
        info!("Recording store initialized at {}", storage_dir.display());

        Ok(Self {
            recorded_dir,
            processed_dir,
        })
    }

    pub fn recorded_dir(&self) -> &Path {
        &self.recorded_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// `<login>-<UTC %Y%m%d-%H%M%S>-<stream id>`
    pub fn recording_stem(stream: &StreamRecord, now: DateTime<Utc>) -> String {
        format!(
            "{}-{}-{}",
            stream.user_login,
            now.format("%Y%m%d-%H%M%S"),
            stream.id
        )
    }

    pub fn raw_video_path(&self, stem: &str) -> PathBuf {
        self.recorded_dir.join(format!("{}.{}", stem, VIDEO_EXTENSION))
    }

    /// Where the processed counterpart of `raw_video` goes.
    pub fn processed_video_path(&self, raw_video: &Path) -> PathBuf {
        match raw_video.file_name() {
            Some(name) => self.processed_dir.join(name),
            None => self.processed_dir.join(format!("unnamed.{}", VIDEO_EXTENSION)),
        }
    }

    pub fn sidecar_path(video: &Path) -> PathBuf {
        video.with_extension(SIDECAR_EXTENSION)
    }

    /// Raw recordings that have not been processed yet, oldest name first.
    pub fn pending_recordings(&self) -> Result<Vec<PathBuf>, StorageError> {
        let entries = fs::read_dir(&self.recorded_dir).map_err(|e| {
            error!("Failed to read {}: {}", self.recorded_dir.display(), e);
            StorageError::ReadFailed(format!("{}: {}", self.recorded_dir.display(), e))
        })?;

        let mut videos: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|s| s.to_str()) == Some(VIDEO_EXTENSION)
            })
            .collect();
        videos.sort();
        debug!("Found {} pending recording(s)", videos.len());
        Ok(videos)
    }

    /// Writes `metadata` as pretty JSON, replacing the file atomically.
    pub fn save_metadata(path: &Path, metadata: &RecordingMetadata) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(metadata)
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, path))
            .map_err(|e| {
                error!("Failed to write metadata {}: {}", path.display(), e);
                StorageError::WriteFailed(format!("{}: {}", path.display(), e))
            })?;
        debug!("Saved metadata to {}", path.display());
        Ok(())
    }

    pub fn load_metadata(path: &Path) -> Result<RecordingMetadata, StorageError> {
        let content = fs::read_to_string(path).map_err(|e| {
            StorageError::ReadFailed(format!("{}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            error!("Invalid metadata in {}: {}", path.display(), e);
            StorageError::InvalidData(format!("{}: {}", path.display(), e))
        })
    }
}
