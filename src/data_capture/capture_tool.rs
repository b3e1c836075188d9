use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error_handling::types::ProcessError;

use super::types::CaptureJob;

/// Something able to record a live stream into a file.
#[async_trait]
pub trait CaptureTool: Send + Sync {
    /// Starts recording `stream_url` into `output_path` and returns the
    /// running job. The file keeps growing until the job exits.
    ///
    /// A missing executable or a process that fails right away is reported
    /// with an error for which [`ProcessError::is_fatal`] is true.
    async fn start_capture(
        &self,
        stream_url: &str,
        output_path: &Path,
    ) -> Result<CaptureJob, ProcessError>;
}

#[async_trait]
impl<T: CaptureTool + ?Sized> CaptureTool for Arc<T> {
    async fn start_capture(
        &self,
        stream_url: &str,
        output_path: &Path,
    ) -> Result<CaptureJob, ProcessError> {
        (**self).start_capture(stream_url, output_path).await
    }
}
