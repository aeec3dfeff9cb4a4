//! mkvmerge command builder.
//!
//! mkvmerge binds track flags to the input file that follows them, so each
//! track's directives are emitted immediately before its path. The tool
//! always remuxes losslessly; there are no codec-copy flags to set.

use std::path::Path;

use crate::lang::LanguageNormalizer;
use crate::models::{MediaKind, OutputTrack};

use super::ToolCommand;

/// Builder for the mkvmerge multi-track mux invocation.
pub struct MkvmergeBuilder<'a> {
    binary: &'a Path,
    tracks: &'a [OutputTrack],
    output_stem: &'a Path,
}

impl<'a> MkvmergeBuilder<'a> {
    /// Create a new mkvmerge builder.
    ///
    /// `output_stem` is the output path without extension; mkvmerge output
    /// is always `.mkv`.
    pub fn new(binary: &'a Path, tracks: &'a [OutputTrack], output_stem: &'a Path) -> Self {
        Self {
            binary,
            tracks,
            output_stem,
        }
    }

    /// Build the complete mkvmerge command.
    ///
    /// The normalizer runs once per descriptor before its directives are
    /// emitted.
    pub fn build(&self, normalizer: &dyn LanguageNormalizer) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.binary);
        cmd.arg("-q");
        cmd.arg("--output");
        cmd.arg(format!("{}.mkv", self.output_stem.display()));
        cmd.arg("--no-chapters");

        let mut seen_audio = false;
        for track in self.tracks {
            let mut track = track.clone();
            normalizer.normalize(&mut track);

            cmd.arg("--language");
            cmd.arg(format!("0:{}", track.lang_code()));

            // Subtitles never default; audio defaults only for the first
            // audio track.
            if track.kind == MediaKind::Subtitles {
                cmd.args(["--default-track", "0:no"]);
            }
            if track.kind == MediaKind::Audio {
                if seen_audio {
                    cmd.args(["--default-track", "0:no"]);
                }
                seen_audio = true;
            }

            if let Some(title) = track.title.as_deref().filter(|t| !t.is_empty()) {
                cmd.arg("--track-name");
                cmd.arg(format!("0:{}", title));
            }

            cmd.arg(track.path.to_string_lossy());
        }

        tracing::debug!("Built mkvmerge command: {}", cmd.display_line());
        cmd
    }
}
