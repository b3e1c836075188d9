pub mod configuration;
pub mod controller;
pub mod data_capture;
pub mod error_handling;
pub mod logging;
pub mod post_processing;
pub mod storage;
pub mod twitch_api;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{Controller, RecorderState, Timings, TwitchController};
