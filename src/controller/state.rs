use std::fmt;

/// Where the poll loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    /// Waiting for the broadcaster to go live.
    #[default]
    Idle,
    /// A capture is running.
    Recording,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecorderState::Idle => write!(f, "IDLE"),
            RecorderState::Recording => write!(f, "RECORDING"),
        }
    }
}
