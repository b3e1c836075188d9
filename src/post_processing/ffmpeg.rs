use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};

use log::{debug, error};
use tokio::process::Command;

use crate::error_handling::types::ProcessError;

/// Thin wrapper around the `ffmpeg` and `ffprobe` executables.
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegTools {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Dumps the container's existing metadata as an ffmetadata file.
    pub async fn extract_metadata(&self, input: &Path, meta_out: &Path) -> Result<(), ProcessError> {
        run_tool(
            &self.ffmpeg,
            &[
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-f"),
                OsStr::new("ffmetadata"),
                meta_out.as_os_str(),
            ],
        )
        .await?;
        Ok(())
    }

    /// Container duration in seconds.
    pub async fn probe_duration(&self, input: &Path) -> Result<f64, ProcessError> {
        let output = run_tool(
            &self.ffprobe,
            &[
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-show_entries"),
                OsStr::new("format=duration"),
                OsStr::new("-of"),
                OsStr::new("default=noprint_wrappers=1:nokey=1"),
            ],
        )
        .await?;
        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }

    /// Remuxes `input` into `output` with the global metadata and chapters of
    /// `meta`, copying every stream.
    pub async fn apply_metadata(
        &self,
        input: &Path,
        meta: &Path,
        output: &Path,
    ) -> Result<(), ProcessError> {
        run_tool(
            &self.ffmpeg,
            &[
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-i"),
                meta.as_os_str(),
                OsStr::new("-map_metadata"),
                OsStr::new("1"),
                OsStr::new("-c"),
                OsStr::new("copy"),
                output.as_os_str(),
            ],
        )
        .await?;
        Ok(())
    }
}

fn parse_duration(stdout: &str) -> Result<f64, ProcessError> {
    let trimmed = stdout.trim();
    match trimmed.parse::<f64>() {
        Ok(duration) if duration.is_finite() && duration >= 0.0 => Ok(duration),
        _ => Err(ProcessError::InvalidOutput(format!(
            "ffprobe duration {:?}",
            trimmed
        ))),
    }
}

/// Runs a tool to completion, mapping spawn failures and non-zero exits to
/// [`ProcessError`]. Stderr is logged when the tool fails.
pub async fn run_tool(
    executable: &str,
    args: &[&OsStr],
) -> Result<Output, ProcessError> {
    debug!("Running {} {:?}", executable, args);
    let output = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            error!("Failed to spawn {}: {}", executable, e);
            ProcessError::SpawnFailed(format!("{}: {}", executable, e))
        })?;

    if !output.status.success() {
        error!(
            "{} exited with {}: {}",
            executable,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Err(ProcessError::NonZeroExit {
            tool: executable.to_string(),
            code: output.status.code(),
        });
    }
    Ok(output)
}
