use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error_handling::types::ProcessError;
use crate::storage::types::RecordingMetadata;

/// Turns a finished raw recording into its final, tagged form.
#[async_trait]
pub trait Finalizer: Send + Sync {
    /// Returns the path of the final file. On error the raw recording and
    /// its sidecar must be left as they were.
    async fn finalize(
        &self,
        raw_file: &Path,
        metadata: &RecordingMetadata,
    ) -> Result<PathBuf, ProcessError>;
}

#[async_trait]
impl<T: Finalizer + ?Sized> Finalizer for Arc<T> {
    async fn finalize(
        &self,
        raw_file: &Path,
        metadata: &RecordingMetadata,
    ) -> Result<PathBuf, ProcessError> {
        (**self).finalize(raw_file, metadata).await
    }
}
