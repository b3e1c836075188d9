//! Stream capture subsystem.
//!
//! - `types`: [`CaptureJob`], the handle on a running capture process.
//! - `capture_tool`: the [`CaptureTool`] seam used by the controller.
//! - `streamlink`: [`StreamlinkCapture`], the streamlink-backed implementation.
//! - `metadata_tracker`: [`MetadataTracker`], which follows title and category
//!   changes while a capture runs.

pub mod capture_tool;
pub mod metadata_tracker;
pub mod streamlink;
pub mod types;

pub use capture_tool::CaptureTool;
pub use metadata_tracker::MetadataTracker;
pub use streamlink::StreamlinkCapture;
pub use types::CaptureJob;
