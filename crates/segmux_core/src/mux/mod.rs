//! Mux command construction for external multiplexers.
//!
//! Builders here never execute anything: each one derives an immutable
//! [`ToolCommand`] that the [`crate::runner`] module hands to the external
//! tool. Keeping the description separate from the invocation makes the
//! stream-index bookkeeping testable without spawning a process.

mod command;
mod ffmpeg_merge;
mod ffmpeg_mux;
mod mkvmerge;

pub use command::{format_args_pretty, ToolCommand};
pub use ffmpeg_merge::{detect_replacement_audio, FfmpegMergeBuilder, MergeOptions};
pub use ffmpeg_mux::FfmpegMuxBuilder;
pub use mkvmerge::MkvmergeBuilder;

use crate::models::ContainerFormat;

/// Error types for mux command building.
#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    /// The requested container cannot be produced by the multi-track mux
    /// path. Rejected before any process is spawned.
    #[error("Container format {0} is not supported for track muxing")]
    UnsupportedFormat(ContainerFormat),

    /// I/O failure while preparing the command (concat manifest, output
    /// path resolution).
    #[error("I/O failure while building mux command: {0}")]
    Io(#[from] std::io::Error),
}
