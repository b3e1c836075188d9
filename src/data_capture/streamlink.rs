use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::configuration::Config;
use crate::error_handling::types::ProcessError;

use super::capture_tool::CaptureTool;
use super::types::CaptureJob;

/// Records streams by running `streamlink`.
#[derive(Debug, Clone)]
pub struct StreamlinkCapture {
    executable: String,
    quality: String,
    disable_ads: bool,
    oauth_token: Option<String>,
    startup_grace: Duration,
}

impl StreamlinkCapture {
    pub fn from_config(config: &Config) -> Self {
        Self {
            executable: config.executables.streamlink.clone(),
            quality: config.capture.quality.clone(),
            disable_ads: config.capture.disable_ads,
            oauth_token: config.oauth_token().map(str::to_string),
            startup_grace: Duration::from_secs(config.capture.startup_grace_secs),
        }
    }

    /// Command line passed to streamlink, without the program name.
    pub fn arguments(&self, stream_url: &str, output_path: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if self.disable_ads {
            args.push(String::from("--twitch-disable-ads"));
        }
        if let Some(token) = &self.oauth_token {
            args.push(format!(
                "--twitch-api-header=Authorization=OAuth {}",
                token
            ));
        }
        args.push(String::from("--output"));
        args.push(output_path.to_string_lossy().to_string());
        args.push(stream_url.to_string());
        args.push(self.quality.clone());
        args
    }
}

#[async_trait]
impl CaptureTool for StreamlinkCapture {
    async fn start_capture(
        &self,
        stream_url: &str,
        output_path: &Path,
    ) -> Result<CaptureJob, ProcessError> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(
            "Recording {} with {} quality to {}",
            stream_url,
            self.quality,
            output_path.display()
        );
        let mut child = Command::new(&self.executable)
            .args(self.arguments(stream_url, output_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!("Failed to spawn {}: {}", self.executable, e);
                ProcessError::SpawnFailed(format!("{}: {}", self.executable, e))
            })?;

        if let Some(stdout) = child.stdout.take() {
            forward_output("streamlink", "stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_output("streamlink", "stderr", stderr);
        }

        let started_at = Utc::now();
        // An immediate failure means a broken install or bad arguments, not a
        // stream that went away.
        match tokio::time::timeout(self.startup_grace, child.wait()).await {
            Ok(Ok(status)) if !status.success() => {
                error!("{} failed right after start: {}", self.executable, status);
                Err(ProcessError::ExitedImmediately {
                    tool: self.executable.clone(),
                    code: status.code(),
                })
            }
            Ok(Ok(status)) => {
                debug!("{} finished within the startup window: {}", self.executable, status);
                Ok(CaptureJob::new(&self.executable, child, output_path.to_path_buf(), started_at))
            }
            Ok(Err(e)) => Err(ProcessError::IoError(e)),
            Err(_) => Ok(CaptureJob::new(&self.executable, child, output_path.to_path_buf(), started_at)),
        }
    }
}

/// Relays a child's output into the log line by line.
fn forward_output<R>(tool: &'static str, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(reader).lines();
    tokio::spawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("[{}][{}] {}", tool, stream, line);
        }
        debug!("[{}][{}] stream closed", tool, stream);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    #[cfg(unix)]
    use crate::test_support::write_script;

    fn capture(executable: &str, token: Option<&str>) -> StreamlinkCapture {
        StreamlinkCapture {
            executable: executable.to_string(),
            quality: String::from("best"),
            disable_ads: true,
            oauth_token: token.map(str::to_string),
            startup_grace: Duration::from_millis(500),
        }
    }

    #[test]
    fn builds_streamlink_arguments() {
        let args = capture("streamlink", Some("abc")).arguments(
            "twitch.tv/somebody",
            &PathBuf::from("/vods/recorded/somebody/x.mp4"),
        );
        assert_eq!(
            args,
            vec![
                "--twitch-disable-ads",
                "--twitch-api-header=Authorization=OAuth abc",
                "--output",
                "/vods/recorded/somebody/x.mp4",
                "twitch.tv/somebody",
                "best",
            ]
        );

        let mut plain = capture("streamlink", None);
        plain.disable_ads = false;
        assert_eq!(
            plain.arguments("twitch.tv/a", &PathBuf::from("o.mp4")),
            vec!["--output", "o.mp4", "twitch.tv/a", "best"]
        );
    }

    #[tokio::test]
    async fn missing_executable_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = capture("/definitely/not/streamlink", None)
            .start_capture("twitch.tv/a", &dir.path().join("a.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::SpawnFailed(_)));
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn immediate_failure_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = capture("false", None)
            .start_capture("twitch.tv/a", &dir.path().join("a.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::ExitedImmediately { code: Some(1), .. }));
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn long_running_capture_returns_a_job() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("nested/a.mp4");
        // Stand-in that keeps running like a live capture.
        let script = write_script(dir.path(), "fake-streamlink", "exec sleep 30");

        let mut job = capture(script.to_str().unwrap(), None)
            .start_capture("twitch.tv/a", &output)
            .await
            .unwrap();
        assert!(dir.path().join("nested").is_dir());
        assert_eq!(job.output_path, output);
        assert!(job.id().is_some());

        let status = job.terminate(Duration::from_secs(5)).await.unwrap();
        assert!(!status.success());
    }
}
