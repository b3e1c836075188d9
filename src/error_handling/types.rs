use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    MissingExecutable(String),
    InvalidValue(String),
    DirectoryError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::MissingExecutable(e) => write!(f, "Could not find executable: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration value: {}", e),
            ConfigError::DirectoryError(e) => write!(f, "Directory error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failures talking to the platform API.
///
/// `Auth` covers both rejected client credentials on the token endpoint and
/// an expired/invalid bearer token on the streams endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Auth(String),
    BadRequest(String),
    Network(String),
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Auth(e) => write!(f, "Authorization error: {}", e),
            ApiError::BadRequest(e) => write!(f, "Bad request: {}", e),
            ApiError::Network(e) => write!(f, "Network error: {}", e),
            ApiError::Decode(e) => write!(f, "Response decoding error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[derive(Debug)]
pub enum ProcessError {
    SpawnFailed(String),
    ExitedImmediately { tool: String, code: Option<i32> },
    NonZeroExit { tool: String, code: Option<i32> },
    IoError(std::io::Error),
    InvalidOutput(String),
    MetadataError(String),
}

impl ProcessError {
    /// Errors that mean the configured tool cannot work at all, as opposed
    /// to a single recording attempt going wrong.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProcessError::SpawnFailed(_) | ProcessError::ExitedImmediately { .. }
        )
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::SpawnFailed(e) => write!(f, "Process spawn failed: {}", e),
            ProcessError::ExitedImmediately { tool, code } => {
                write!(f, "{} exited immediately with status {:?}", tool, code)
            }
            ProcessError::NonZeroExit { tool, code } => {
                write!(f, "{} exited with status {:?}", tool, code)
            }
            ProcessError::IoError(e) => write!(f, "Process IO error: {}", e),
            ProcessError::InvalidOutput(e) => write!(f, "Unexpected process output: {}", e),
            ProcessError::MetadataError(e) => write!(f, "Metadata error: {}", e),
        }
    }
}

impl std::error::Error for ProcessError {}

impl From<std::io::Error> for ProcessError {
    fn from(err: std::io::Error) -> Self {
        ProcessError::IoError(err)
    }
}

#[derive(Debug)]
pub enum StorageError {
    WriteFailed(String),
    ReadFailed(String),
    InvalidData(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::WriteFailed(e) => write!(f, "Storage write failed: {}", e),
            StorageError::ReadFailed(e) => write!(f, "Storage read failed: {}", e),
            StorageError::InvalidData(e) => write!(f, "Invalid stored data: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for ProcessError {
    fn from(err: StorageError) -> Self {
        ProcessError::MetadataError(err.to_string())
    }
}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    ApiError(ApiError),
    ProcessError(ProcessError),
    StorageError(StorageError),
    InitializationFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::ApiError(e) => write!(f, "API error: {}", e),
            ControllerError::ProcessError(e) => write!(f, "Process error: {}", e),
            ControllerError::StorageError(e) => write!(f, "Storage error: {}", e),
            ControllerError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<ApiError> for ControllerError {
    fn from(err: ApiError) -> Self {
        ControllerError::ApiError(err)
    }
}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        ControllerError::StorageError(err)
    }
}

impl From<ProcessError> for ControllerError {
    fn from(err: ProcessError) -> Self {
        ControllerError::ProcessError(err)
    }
}
