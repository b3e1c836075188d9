//! Poll loop driving the recorder.
//!
//! - `state`: [`RecorderState`], the IDLE/RECORDING states.
//! - `controller_handler`: [`Controller`], which polls the API, runs captures
//!   and hands finished recordings to post-processing.
//! - `shutdown`: forwards SIGINT/SIGTERM into the controller's shutdown channel.

pub mod controller_handler;
pub mod shutdown;
pub mod state;

pub use controller_handler::{Controller, Timings, TwitchController};
pub use state::RecorderState;
