use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::io::AsyncWriteExt;

use crate::configuration::types::ChapterPolicy;
use crate::configuration::Config;
use crate::error_handling::types::ProcessError;
use crate::storage::file_storage::RecordingStore;
use crate::storage::types::RecordingMetadata;

use super::ffmetadata;
use super::ffmpeg::FfmpegTools;
use super::finalizer::Finalizer;

const META_EXTENSION: &str = "meta";

/// Tags raw recordings with ffmpeg and moves them to the processed directory.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    tools: FfmpegTools,
    store: RecordingStore,
    policy: ChapterPolicy,
}

/// Files written into the processed directory for one recording.
struct Outputs {
    video: PathBuf,
    meta: PathBuf,
    sidecar: PathBuf,
}

impl Outputs {
    fn all(&self) -> [&Path; 3] {
        [&self.video, &self.meta, &self.sidecar]
    }
}

impl PostProcessor {
    pub fn new(tools: FfmpegTools, store: RecordingStore, policy: ChapterPolicy) -> Self {
        Self {
            tools,
            store,
            policy,
        }
    }

    pub fn from_config(config: &Config, store: RecordingStore) -> Self {
        Self::new(
            FfmpegTools::new(&config.executables.ffmpeg, &config.executables.ffprobe),
            store,
            config.chapters.clone(),
        )
    }

    fn outputs_for(&self, raw_file: &Path) -> Outputs {
        let video = self.store.processed_video_path(raw_file);
        Outputs {
            meta: video.with_extension(META_EXTENSION),
            sidecar: RecordingStore::sidecar_path(&video),
            video,
        }
    }

    async fn run(
        &self,
        raw_file: &Path,
        metadata: &RecordingMetadata,
        outputs: &Outputs,
    ) -> Result<(), ProcessError> {
        remove_files(&outputs.all()).await;

        self.tools.extract_metadata(raw_file, &outputs.meta).await?;
        let duration = self.tools.probe_duration(raw_file).await?;

        let end_time = modified_secs(raw_file).await?;
        let metadata = RecordingMetadata {
            start_time: Some(end_time - duration),
            end_time: Some(end_time),
            ..metadata.clone()
        };
        debug!(
            "{}: duration {:.3}s, ends at {:.3}",
            raw_file.display(),
            duration,
            end_time
        );

        let fragment = ffmetadata::render(&metadata, &self.policy);
        let mut meta_file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&outputs.meta)
            .await?;
        meta_file.write_all(fragment.as_bytes()).await?;
        meta_file.flush().await?;
        drop(meta_file);

        self.tools
            .apply_metadata(raw_file, &outputs.meta, &outputs.video)
            .await?;
        RecordingStore::save_metadata(&outputs.sidecar, &metadata)?;

        let raw_sidecar = RecordingStore::sidecar_path(raw_file);
        remove_files(&[raw_file, &raw_sidecar, &outputs.meta]).await;
        Ok(())
    }
}

#[async_trait]
impl Finalizer for PostProcessor {
    async fn finalize(
        &self,
        raw_file: &Path,
        metadata: &RecordingMetadata,
    ) -> Result<PathBuf, ProcessError> {
        info!("Processing {}", raw_file.display());
        let outputs = self.outputs_for(raw_file);
        match self.run(raw_file, metadata, &outputs).await {
            Ok(()) => {
                info!("Processed {} into {}", raw_file.display(), outputs.video.display());
                Ok(outputs.video)
            }
            Err(e) => {
                error!("Processing {} failed: {}", raw_file.display(), e);
                remove_files(&outputs.all()).await;
                Err(e)
            }
        }
    }
}

/// Finalizes every raw recording left in the store, oldest first.
///
/// A missing sidecar falls back to empty metadata. A sidecar that cannot be
/// read skips the recording and leaves both files in place. Failures are
/// logged and the recording stays in place for the next pass. Returns the
/// number of recordings processed.
pub async fn process_backlog<F: Finalizer + ?Sized>(finalizer: &F, store: &RecordingStore) -> usize {
    let pending = match store.pending_recordings() {
        Ok(pending) => pending,
        Err(e) => {
            warn!("Unable to list pending recordings: {}", e);
            return 0;
        }
    };
    if !pending.is_empty() {
        info!("Processing {} pending recording(s)", pending.len());
    }

    let mut processed = 0;
    for raw_file in pending {
        let sidecar = RecordingStore::sidecar_path(&raw_file);
        let metadata = if sidecar.exists() {
            match RecordingStore::load_metadata(&sidecar) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(
                        "Skipping {}: unable to read {}: {}, please fix the file contents and try again",
                        raw_file.display(),
                        sidecar.display(),
                        e
                    );
                    continue;
                }
            }
        } else {
            debug!("No metadata for {}", raw_file.display());
            RecordingMetadata::default()
        };

        match finalizer.finalize(&raw_file, &metadata).await {
            Ok(_) => processed += 1,
            Err(e) => warn!("Leaving {} unprocessed: {}", raw_file.display(), e),
        }
    }
    processed
}

async fn modified_secs(path: &Path) -> Result<f64, ProcessError> {
    let modified = tokio::fs::metadata(path).await?.modified()?;
    modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .map_err(|e| ProcessError::MetadataError(format!("{}: {}", path.display(), e)))
}

async fn remove_files(paths: &[&Path]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Unable to remove {}: {}", path.display(), e),
        }
    }
}
