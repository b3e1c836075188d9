//! Storage subsystem
//!
//! Recordings live on the filesystem only:
//! - `types`: [`types::RecordingMetadata`] and [`types::Chapter`], persisted
//!   as JSON sidecars next to each video.
//! - `file_storage`: [`file_storage::RecordingStore`], the directory layout,
//!   file naming and backlog discovery.

pub mod file_storage;
pub mod types;
