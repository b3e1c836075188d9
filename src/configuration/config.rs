use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command-line arguments.
///
/// Everything except the broadcaster and the location of the configuration
/// file lives in the configuration file.
#[derive(Parser, Debug, Clone)]
#[command(name = "twitch-recorder")]
#[command(version)]
#[command(about = "Records a Twitch broadcaster's streams as soon as they go live")]
pub struct Args {
    /// Broadcaster login to watch
    #[arg(short, long)]
    pub username: String,

    /// Path of the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Broadcaster logins are case-insensitive on the platform; everything
    /// downstream (file names, API queries) uses the lower-case form.
    pub fn normalized_username(&self) -> String {
        self.username.trim().to_lowercase()
    }

    /// Parsed `--log-level`, if one was given.
    pub fn log_level_filter(&self) -> Result<Option<log::LevelFilter>, ConfigError> {
        self.log_level
            .as_deref()
            .map(|level| {
                level
                    .parse::<log::LevelFilter>()
                    .map_err(|_| ConfigError::InvalidValue(format!("invalid log level: {}", level)))
            })
            .transpose()
    }
}

/// Application configuration loaded from a TOML file.
///
/// # Fields Overview
///
/// - `client_id` / `client_secret`: application credentials for the token endpoint
/// - `oauth_token`: optional user token handed to streamlink, which skips ads
///   for subscribers
/// - `storage_dir`: root of the `recorded/` and `processed/` trees
/// - `logging_dir`: where `<username>.log` is written
/// - `log_level`: default level when none is given on the command line
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub oauth_token: Option<String>,
    pub storage_dir: PathBuf,
    pub logging_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub executables: ExecutablesConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub chapters: ChapterPolicy,
}

fn default_log_level() -> String {
    String::from("info")
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue("client_id must not be empty".into()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "client_secret must not be empty".into(),
            ));
        }
        if self.polling.stream_interval_secs == 0 || self.polling.metadata_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "polling intervals must be at least one second".into(),
            ));
        }
        if self.chapters.timebase == 0 {
            return Err(ConfigError::InvalidValue("chapters.timebase must be positive".into()));
        }
        if !self.chapters.min_chapter_secs.is_finite() || self.chapters.min_chapter_secs < 0.0 {
            return Err(ConfigError::InvalidValue(
                "chapters.min_chapter_secs must be a non-negative number".into(),
            ));
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }

    /// The bypass token, if one is configured and non-blank.
    pub fn oauth_token(&self) -> Option<&str> {
        self.oauth_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Makes sure every external tool can be found before anything starts.
    pub fn check_executables(&self) -> Result<(), ConfigError> {
        for exe in [
            &self.executables.streamlink,
            &self.executables.ffmpeg,
            &self.executables.ffprobe,
        ] {
            match resolve_executable(exe) {
                Some(path) => debug!("Resolved {} to {}", exe, path.display()),
                None => return Err(ConfigError::MissingExecutable(exe.clone())),
            }
        }
        Ok(())
    }
}

/// Looks `name` up the way a shell would: as a path when it contains a
/// separator, otherwise in every `PATH` entry.
pub fn resolve_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|p| is_executable(p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
