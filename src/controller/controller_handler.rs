use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::configuration::Config;
use crate::data_capture::{CaptureTool, MetadataTracker, StreamlinkCapture};
use crate::error_handling::types::{ApiError, ControllerError};
use crate::post_processing::{process_backlog, Finalizer, PostProcessor};
use crate::storage::file_storage::RecordingStore;
use crate::twitch_api::types::stream_url_for;
use crate::twitch_api::{AccessToken, StreamApi, StreamRecord, TwitchClient};

use super::state::RecorderState;

/// How long a capture gets to exit after SIGTERM before it is killed.
const STOP_GRACE: Duration = Duration::from_secs(10);

/// Intervals driving the poll loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    pub stream_interval: Duration,
    pub metadata_interval: Duration,
    pub stop_grace: Duration,
}

impl Timings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            stream_interval: Duration::from_secs(config.polling.stream_interval_secs),
            metadata_interval: Duration::from_secs(config.polling.metadata_interval_secs),
            stop_grace: STOP_GRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

/// The recorder's poll loop.
///
/// # Fields Overview
///
/// - `api`: live status and metadata lookups
/// - `capture`: starts the recording process when the broadcaster is live
/// - `finalizer`: tags finished recordings and moves them to storage
/// - `store`: directory layout for this broadcaster
/// - `token`: the current access token, fetched lazily and refreshed on
///   expiry or rejection
/// - `state`: IDLE or RECORDING; at most one capture runs at a time
pub struct Controller<A, C, F> {
    api: A,
    capture: C,
    finalizer: F,
    store: RecordingStore,
    username: String,
    timings: Timings,
    token: Option<AccessToken>,
    state: RecorderState,
}

/// The controller wired to Helix, streamlink and ffmpeg.
pub type TwitchController = Controller<TwitchClient, StreamlinkCapture, PostProcessor>;

impl TwitchController {
    pub fn from_config(config: &Config, username: &str) -> Result<Self, ControllerError> {
        // The username becomes a directory name.
        if username.is_empty() || username.contains(['/', '\\']) || username.starts_with('.') {
            return Err(ControllerError::InitializationFailed(format!(
                "invalid username '{}'",
                username
            )));
        }
        let store = RecordingStore::new(&config.storage_dir, username)?;
        Ok(Controller::new(
            TwitchClient::new(config)?,
            StreamlinkCapture::from_config(config),
            PostProcessor::from_config(config, store.clone()),
            store,
            username,
            Timings::from_config(config),
        ))
    }
}

impl<A, C, F> Controller<A, C, F>
where
    A: StreamApi,
    C: CaptureTool,
    F: Finalizer,
{
    pub fn new(
        api: A,
        capture: C,
        finalizer: F,
        store: RecordingStore,
        username: &str,
        timings: Timings,
    ) -> Self {
        Self {
            api,
            capture,
            finalizer,
            store,
            username: username.to_string(),
            timings,
            token: None,
            state: RecorderState::Idle,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Runs until `shutdown` turns true or a fatal error occurs.
    ///
    /// Fatal errors are rejected credentials, a token rejected again right
    /// after refreshing it, and a capture tool that cannot run at all.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), ControllerError> {
        info!(
            "Watching {} every {:?}",
            stream_url_for(&self.username),
            self.timings.stream_interval
        );

        match self.api.get_token().await {
            Ok(token) => self.token = Some(token),
            Err(ApiError::Auth(e)) => {
                error!("Credentials rejected: {}", e);
                return Err(ApiError::Auth(e).into());
            }
            Err(e) => warn!("Unable to fetch an access token, retrying on next poll: {}", e),
        }

        if self.process_pending(&mut shutdown).await == Flow::Shutdown {
            return Ok(());
        }

        loop {
            let polled = tokio::select! {
                polled = self.poll_once() => polled?,
                _ = shutdown_requested(&mut shutdown) => break,
            };
            if let Some(stream) = polled {
                if self.record(stream, &mut shutdown).await? == Flow::Shutdown {
                    break;
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(self.timings.stream_interval) => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }
        }

        info!("Shutdown requested, stopping");
        Ok(())
    }

    /// One IDLE poll.
    ///
    /// `Ok(None)` covers both an offline broadcaster and a transient failure;
    /// the next poll is the retry.
    pub async fn poll_once(&mut self) -> Result<Option<StreamRecord>, ControllerError> {
        match self.query_stream().await {
            Ok(Some(stream)) => {
                info!(
                    "{} is live: {} [{}]",
                    stream.user_name, stream.title, stream.game_name
                );
                Ok(Some(stream))
            }
            Ok(None) => {
                debug!("{} is offline", self.username);
                Ok(None)
            }
            Err(ApiError::Auth(e)) => {
                error!("Access token rejected after refreshing: {}", e);
                Err(ApiError::Auth(e).into())
            }
            Err(e) => {
                warn!("Unable to check stream status: {}", e);
                Ok(None)
            }
        }
    }

    /// Looks the stream up, refreshing the token and retrying once when it
    /// is rejected.
    async fn query_stream(&mut self) -> Result<Option<StreamRecord>, ApiError> {
        let token = self.current_token().await?;
        match self.api.get_stream_info(&self.username, &token).await {
            Err(ApiError::Auth(e)) => {
                warn!("Access token rejected ({}), refreshing", e);
                self.token = None;
                let token = self.current_token().await?;
                self.api.get_stream_info(&self.username, &token).await
            }
            result => result,
        }
    }

    async fn current_token(&mut self) -> Result<AccessToken, ApiError> {
        if let Some(token) = &self.token {
            if !token.is_expired(Utc::now()) {
                return Ok(token.clone());
            }
            debug!("Access token expired, refreshing");
        }
        let token = self.api.get_token().await?;
        self.token = Some(token.clone());
        Ok(token)
    }

    async fn record(
        &mut self,
        stream: StreamRecord,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Flow, ControllerError> {
        let now = Utc::now();
        let raw = self
            .store
            .raw_video_path(&RecordingStore::recording_stem(&stream, now));
        let mut tracker =
            MetadataTracker::start(&stream, RecordingStore::sidecar_path(&raw), unix_secs(now));
        if let Err(e) = tracker.persist() {
            warn!("Unable to save metadata: {}", e);
        }

        let mut job = match self.capture.start_capture(&stream.stream_url(), &raw).await {
            Ok(job) => job,
            Err(e) if e.is_fatal() => {
                error!("Unable to start capture: {}", e);
                discard(tracker.sidecar_path());
                return Err(e.into());
            }
            Err(e) => {
                warn!("Capture failed to start: {}", e);
                discard(tracker.sidecar_path());
                return Ok(Flow::Continue);
            }
        };
        self.state = RecorderState::Recording;
        info!("{} (pid {:?})", self.state, job.id());

        let period = self.timings.metadata_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let exit = loop {
            tokio::select! {
                status = job.wait() => break Some(status),
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.track_metadata(&mut tracker) => {}
                        status = job.wait() => break Some(status),
                        _ = shutdown_requested(shutdown) => break None,
                    }
                }
                _ = shutdown_requested(shutdown) => break None,
            }
        };
        let elapsed = Utc::now() - job.started_at;

        let flow = match exit {
            None => {
                if let Err(e) = job.terminate(self.timings.stop_grace).await {
                    error!("Unable to stop {}: {}", job.tool, e);
                }
                Flow::Shutdown
            }
            Some(Ok(status)) if status.success() => {
                info!(
                    "Capture of {} finished after {}s",
                    stream.user_login,
                    elapsed.num_seconds()
                );
                Flow::Continue
            }
            Some(Ok(status)) => {
                warn!(
                    "{} exited with {} after {}s",
                    job.tool,
                    status,
                    elapsed.num_seconds()
                );
                Flow::Continue
            }
            Some(Err(e)) => {
                warn!("Lost track of {}: {}", job.tool, e);
                Flow::Continue
            }
        };

        if let Err(e) = tracker.persist() {
            warn!("Unable to save metadata: {}", e);
        }
        self.state = RecorderState::Idle;
        info!("{}", self.state);

        if flow == Flow::Shutdown {
            info!("Leaving {} for the next start", raw.display());
            return Ok(flow);
        }
        if !has_content(&raw).await {
            warn!("Capture produced no output at {}", raw.display());
            discard(&raw);
            discard(tracker.sidecar_path());
            return Ok(Flow::Continue);
        }
        Ok(self.process_pending(shutdown).await)
    }

    async fn track_metadata(&mut self, tracker: &mut MetadataTracker) {
        match self.query_stream().await {
            Ok(Some(stream)) => {
                if tracker.observe(&stream, unix_secs(Utc::now())) {
                    if let Err(e) = tracker.persist() {
                        warn!("Unable to save metadata: {}", e);
                    }
                }
            }
            Ok(None) => debug!("Stream reported offline, waiting for the capture to end"),
            Err(e) => warn!("Unable to refresh stream metadata: {}", e),
        }
    }

    /// Finalizes everything left in the recorded directory.
    async fn process_pending(&self, shutdown: &mut watch::Receiver<bool>) -> Flow {
        tokio::select! {
            count = process_backlog(&self.finalizer, &self.store) => {
                if count > 0 {
                    info!("Processed {} recording(s)", count);
                }
                Flow::Continue
            }
            _ = shutdown_requested(shutdown) => {
                warn!(
                    "Post-processing interrupted, unfinished recordings stay in {}",
                    self.store.recorded_dir().display()
                );
                Flow::Shutdown
            }
        }
    }
}

/// Resolves once `shutdown` holds `true`. Never resolves if the sender is
/// dropped without requesting a shutdown.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let closed = shutdown.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

fn unix_secs(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

async fn has_content(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len() > 0)
        .unwrap_or(false)
}

fn discard(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Unable to remove {}: {}", path.display(), e),
    }
}
