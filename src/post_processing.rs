//! Post-processing of finished recordings.
//!
//! - `ffmetadata`: renders recording metadata as tags and chapters.
//! - `ffmpeg`: runs `ffmpeg`/`ffprobe`.
//! - `finalizer`: the [`Finalizer`] seam used by the controller.
//! - `processor`: [`PostProcessor`] and the backlog pass.

pub mod ffmetadata;
pub mod ffmpeg;
pub mod finalizer;
pub mod processor;

pub use finalizer::Finalizer;
pub use processor::{process_backlog, PostProcessor};
