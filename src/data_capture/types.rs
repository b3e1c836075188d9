//! Core types used by the capture subsystem.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::process::Child;

use crate::error_handling::types::ProcessError;

/// Program used to deliver SIGTERM, found on `PATH`.
const KILL_PROGRAM: &str = "kill";

/// A running capture process and the file it writes to.
///
/// The child is spawned with `kill_on_drop`, so dropping the job without
/// waiting on it never leaves an orphaned capture behind.
#[derive(Debug)]
pub struct CaptureJob {
    /// Name of the tool, for logs and errors.
    pub tool: String,
    /// File the capture is writing to.
    pub output_path: PathBuf,
    /// When the process was started.
    pub started_at: DateTime<Utc>,
    child: Child,
}

impl CaptureJob {
    pub fn new(
        tool: impl Into<String>,
        child: Child,
        output_path: PathBuf,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tool: tool.into(),
            output_path,
            started_at,
            child,
        }
    }

    /// OS process id, `None` once the process has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Waits for the capture to end on its own. Cancel safe.
    pub async fn wait(&mut self) -> Result<ExitStatus, ProcessError> {
        let status = self.child.wait().await?;
        debug!("{} exited with {}", self.tool, status);
        Ok(status)
    }

    /// Asks the capture to stop, escalating to a kill after `grace`.
    ///
    /// A polite stop first lets the tool flush and close the container.
    pub async fn terminate(&mut self, grace: Duration) -> Result<ExitStatus, ProcessError> {
        self.terminate_with(KILL_PROGRAM, grace).await
    }

    /// Like [`terminate`](Self::terminate), signalling through `kill_program`.
    /// When that program cannot deliver SIGTERM the process is killed at once.
    async fn terminate_with(
        &mut self,
        kill_program: &str,
        grace: Duration,
    ) -> Result<ExitStatus, ProcessError> {
        if let Some(status) = self.child.try_wait()? {
            debug!("{} already exited with {}", self.tool, status);
            return Ok(status);
        }

        info!("Stopping {} (pid {:?})", self.tool, self.child.id());
        if self.request_stop(kill_program).await {
            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(status) => return Ok(status?),
                Err(_) => warn!(
                    "{} did not stop within {:?}, killing it",
                    self.tool, grace
                ),
            }
        }

        self.child.kill().await?;
        Ok(self.child.wait().await?)
    }

    /// Sends SIGTERM; returns false when no signal could be delivered.
    #[cfg(unix)]
    async fn request_stop(&self, kill_program: &str) -> bool {
        let Some(pid) = self.child.id() else {
            return false;
        };
        match tokio::process::Command::new(kill_program)
            .arg("-TERM")
            .arg(pid.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) if status.success() => true,
            Ok(status) => {
                warn!(
                    "{} -TERM {} exited with {}, killing {}",
                    kill_program, pid, status, self.tool
                );
                false
            }
            Err(e) => {
                warn!(
                    "Unable to run {} for {} (pid {}): {}, killing it",
                    kill_program, self.tool, pid, e
                );
                false
            }
        }
    }

    #[cfg(not(unix))]
    async fn request_stop(&self, _kill_program: &str) -> bool {
        false
    }
}
