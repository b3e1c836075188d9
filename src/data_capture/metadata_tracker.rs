use std::path::{Path, PathBuf};

use log::info;

use crate::error_handling::types::StorageError;
use crate::storage::file_storage::RecordingStore;
use crate::storage::types::{Chapter, RecordingMetadata};
use crate::twitch_api::types::StreamRecord;

/// Follows a live stream's category and title while it is being recorded.
///
/// Every observed change is appended with its wall-clock time so chapters can
/// be laid out once the recording's real start time is known.
#[derive(Debug)]
pub struct MetadataTracker {
    metadata: RecordingMetadata,
    sidecar_path: PathBuf,
    current_game: Option<String>,
    current_title: Option<String>,
}

impl MetadataTracker {
    /// Seeds the metadata from the record that triggered the recording and
    /// observes it at `now` (UNIX seconds).
    pub fn start(stream: &StreamRecord, sidecar_path: PathBuf, now: f64) -> Self {
        let metadata = RecordingMetadata {
            id: Some(stream.id.clone()),
            title: Some(stream.title.clone()),
            author: Some(stream.user_name.clone()),
            description: Some(format!(
                "Streamed on {} at {}",
                stream.started_at.format("%Y-%m-%d %H:%M:%S %Z"),
                stream.stream_url()
            )),
            ..Default::default()
        };
        let mut tracker = Self {
            metadata,
            sidecar_path,
            current_game: None,
            current_title: None,
        };
        tracker.observe(stream, now);
        tracker
    }

    /// Records category and title changes; returns whether anything changed.
    pub fn observe(&mut self, stream: &StreamRecord, now: f64) -> bool {
        let mut changed = false;
        if self.current_game.as_deref() != Some(stream.game_name.as_str()) {
            info!("Setting current game to {}", stream.game_name);
            self.metadata
                .categories
                .push(Chapter::new(stream.game_name.clone(), now));
            self.current_game = Some(stream.game_name.clone());
            changed = true;
        }
        if self.current_title.as_deref() != Some(stream.title.as_str()) {
            info!("Setting current stream title to {}", stream.title);
            self.metadata.titles.push(Chapter::new(stream.title.clone(), now));
            self.current_title = Some(stream.title.clone());
            changed = true;
        }
        changed
    }

    pub fn persist(&self) -> Result<(), StorageError> {
        RecordingStore::save_metadata(&self.sidecar_path, &self.metadata)
    }

    pub fn metadata(&self) -> &RecordingMetadata {
        &self.metadata
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(game: &str, title: &str) -> StreamRecord {
        StreamRecord {
            id: "40000000000".into(),
            user_login: "batatvideogames".into(),
            user_name: "batatvideogames".into(),
            title: title.into(),
            game_name: game.into(),
            started_at: Utc.with_ymd_and_hms(2023, 12, 25, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn seeds_metadata_from_first_record() {
        let tracker = MetadataTracker::start(&record("Game A", "Merry Christmas!"), PathBuf::from("x.json"), 1000.0);
        let metadata = tracker.metadata();
        assert_eq!(metadata.id.as_deref(), Some("40000000000"));
        assert_eq!(metadata.title.as_deref(), Some("Merry Christmas!"));
        assert_eq!(metadata.author.as_deref(), Some("batatvideogames"));
        assert_eq!(
            metadata.description.as_deref(),
            Some("Streamed on 2023-12-25 00:00:00 UTC at twitch.tv/batatvideogames")
        );
        assert_eq!(metadata.categories, vec![Chapter::new("Game A", 1000.0)]);
        assert_eq!(metadata.titles, vec![Chapter::new("Merry Christmas!", 1000.0)]);
    }

    #[test]
    fn only_changes_are_appended() {
        let games = ["A", "A", "B", "B", "C"];
        let mut tracker = MetadataTracker::start(&record(games[0], "t"), PathBuf::from("x.json"), 0.0);
        let changes: Vec<bool> = games[1..]
            .iter()
            .enumerate()
            .map(|(i, game)| tracker.observe(&record(game, "t"), (i as f64 + 1.0) * 30.0))
            .collect();

        assert_eq!(changes, vec![false, true, false, true]);
        assert_eq!(
            tracker.metadata().categories,
            vec![Chapter::new("A", 0.0), Chapter::new("B", 60.0), Chapter::new("C", 120.0)]
        );
        assert_eq!(tracker.metadata().titles.len(), 1);

        assert!(tracker.observe(&record("C", "new title"), 150.0));
        assert_eq!(tracker.metadata().titles[1], Chapter::new("new title", 150.0));
    }

    #[test]
    fn persists_sidecar() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rec.json");
        let tracker = MetadataTracker::start(&record("A", "t"), path.clone(), 5.0);
        tracker.persist().unwrap();
        assert_eq!(&RecordingStore::load_metadata(&path).unwrap(), tracker.metadata());
        assert_eq!(tracker.sidecar_path(), path.as_path());
    }
}
