//! ffmpeg command builder for the simple single-file merge-and-remux.
//!
//! Turns an ordered list of segment files into one container: ffmpeg itself
//! concatenates the segments (concat protocol or concat-demuxer manifest)
//! and copies the streams into the target container without re-encoding.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::models::ContainerFormat;

use super::{MuxError, ToolCommand};

/// Options for the simple single-file merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Target container.
    pub format: ContainerFormat,

    /// Convert ADTS AAC to ASC while copying (`-bsf:a aac_adtstoasc`).
    #[serde(default)]
    pub use_aac_filter: bool,

    /// Place the moov atom up front for progressive playback (MP4 only).
    #[serde(default)]
    pub fast_start: bool,

    /// Write a `date` metadata field.
    #[serde(default = "default_true")]
    pub write_date: bool,

    /// Feed segments through a concat-list manifest file instead of the
    /// `concat:` protocol. Avoids delimiter collisions and very long
    /// single-argument strings.
    #[serde(default)]
    pub use_concat_list: bool,

    /// Poster image muxed in as an attached picture (MP4 only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<PathBuf>,

    /// Replacement DD+ audio spliced in as an extra input (MP4 only).
    /// When set, the AAC bitstream filter is suppressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_audio: Option<PathBuf>,

    /// Title/handler metadata for the primary audio stream.
    #[serde(default)]
    pub audio_name: String,

    /// Container title metadata.
    #[serde(default)]
    pub title: String,

    /// Container copyright metadata.
    #[serde(default)]
    pub copyright: String,

    /// Container comment metadata.
    #[serde(default)]
    pub comment: String,

    /// Container encoding_tool metadata.
    #[serde(default)]
    pub encoding_tool: String,

    /// Recording time override for the `date` field; current time when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_time: Option<String>,
}

fn default_true() -> bool {
    true
}

impl MergeOptions {
    /// Create options for the given container with everything else at its
    /// default.
    pub fn new(format: ContainerFormat) -> Self {
        Self {
            format,
            use_aac_filter: false,
            fast_start: false,
            write_date: true,
            use_concat_list: false,
            poster: None,
            replacement_audio: None,
            audio_name: String::new(),
            title: String::new(),
            copyright: String::new(),
            comment: String::new(),
            encoding_tool: String::new(),
            record_time: None,
        }
    }
}

/// Read the legacy replacement-audio sidecar next to the output stem.
///
/// Some download pipelines signal a DD+ audio splice by dropping a
/// `<stem>.txt` file whose content names the replacement audio file. The
/// builder takes [`MergeOptions::replacement_audio`] explicitly; this helper
/// exists for callers still speaking the sidecar convention.
pub fn detect_replacement_audio(output_stem: &Path) -> Option<PathBuf> {
    let mut sidecar = output_stem.as_os_str().to_os_string();
    sidecar.push(".txt");

    let content = fs::read_to_string(PathBuf::from(sidecar)).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

/// Builder for the ffmpeg simple-merge invocation.
///
/// Generates a [`ToolCommand`] ready to hand to a [`crate::runner::ToolRunner`].
pub struct FfmpegMergeBuilder<'a> {
    binary: &'a Path,
    segments: &'a [PathBuf],
    output_stem: &'a Path,
    options: &'a MergeOptions,
}

impl<'a> FfmpegMergeBuilder<'a> {
    /// Create a new merge builder.
    ///
    /// `output_stem` is the output path without extension; the container
    /// format picks the extension.
    pub fn new(
        binary: &'a Path,
        segments: &'a [PathBuf],
        output_stem: &'a Path,
        options: &'a MergeOptions,
    ) -> Self {
        Self {
            binary,
            segments,
            output_stem,
            options,
        }
    }

    /// Build the complete ffmpeg command.
    pub fn build(&self) -> Result<ToolCommand, MuxError> {
        // Resolve up front: the working directory used for concat input
        // resolution must not shift the final destination.
        let output = self.output_with_extension()?;
        let use_aac_filter =
            self.options.use_aac_filter && self.options.replacement_audio.is_none();

        let mut cmd = ToolCommand::new(self.binary);
        if let Some(dir) = self.segments.first().and_then(|p| p.parent()) {
            if !dir.as_os_str().is_empty() {
                cmd.working_dir = Some(dir.to_path_buf());
            }
        }

        cmd.args(["-loglevel", "warning", "-nostdin"]);
        self.add_input(&mut cmd)?;

        match self.options.format {
            ContainerFormat::Mp4 => self.add_mp4_output(&mut cmd, use_aac_filter, &output),
            ContainerFormat::Mkv | ContainerFormat::Flv => {
                cmd.args(["-map", "0", "-c", "copy", "-y"]);
                add_aac_filter(&mut cmd, use_aac_filter);
                cmd.arg(output.to_string_lossy());
            }
            ContainerFormat::M4a => {
                cmd.args(["-map", "0", "-c", "copy", "-f", "mp4", "-y"]);
                add_aac_filter(&mut cmd, use_aac_filter);
                cmd.arg(output.to_string_lossy());
            }
            ContainerFormat::Ts => {
                cmd.args(["-map", "0", "-c", "copy", "-y"]);
                cmd.args(["-f", "mpegts", "-bsf:v", "h264_mp4toannexb"]);
                cmd.arg(output.to_string_lossy());
            }
            ContainerFormat::Eac3 | ContainerFormat::Aac | ContainerFormat::Ac3 => {
                cmd.args(["-map", "0:a", "-c", "copy", "-y"]);
                cmd.arg(output.to_string_lossy());
            }
        }

        tracing::debug!("Built merge command: {}", cmd.display_line());
        Ok(cmd)
    }

    /// Output stem resolved to an absolute path with the format extension
    /// appended.
    fn output_with_extension(&self) -> Result<PathBuf, MuxError> {
        let absolute = std::path::absolute(self.output_stem)?;
        let mut name = absolute.into_os_string();
        name.push(".");
        name.push(self.options.format.extension());
        Ok(PathBuf::from(name))
    }

    fn add_input(&self, cmd: &mut ToolCommand) -> Result<(), MuxError> {
        if self.options.use_concat_list {
            let manifest = write_concat_manifest(self.segments)?;
            cmd.args(["-f", "concat", "-safe", "0", "-i"]);
            cmd.arg(manifest.to_string_lossy());
        } else {
            // Segment names are resolved against the working directory.
            let joined = self
                .segments
                .iter()
                .map(|p| {
                    p.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| p.to_string_lossy().into_owned())
                })
                .collect::<Vec<_>>()
                .join("|");
            cmd.arg("-i");
            cmd.arg(format!("concat:{}", joined));
        }
        Ok(())
    }

    fn add_mp4_output(&self, cmd: &mut ToolCommand, use_aac_filter: bool, output: &Path) {
        let poster = self.options.poster.as_deref();
        let replacement_audio = self.options.replacement_audio.as_deref();

        // Extra inputs: poster is input 1, replacement audio follows it.
        if let Some(poster) = poster {
            cmd.arg("-i");
            cmd.arg(poster.to_string_lossy());
        }
        if let Some(audio) = replacement_audio {
            cmd.arg("-i");
            cmd.arg(audio.to_string_lossy());
        }

        cmd.args(["-map", "0:v?"]);
        if replacement_audio.is_some() {
            let audio_input = if poster.is_some() { "2:a" } else { "1:a" };
            cmd.args(["-map", audio_input]);
        }
        cmd.args(["-map", "0:a?"]);

        if poster.is_some() {
            cmd.args(["-map", "1", "-c:v:1", "copy", "-disposition:v:1", "attached_pic"]);
        }

        if self.options.write_date {
            cmd.arg("-metadata");
            cmd.arg(format!("date={}", self.date_string()));
        }
        cmd.arg("-metadata");
        cmd.arg(format!("encoding_tool={}", self.options.encoding_tool));
        cmd.arg("-metadata");
        cmd.arg(format!("title={}", self.options.title));
        cmd.arg("-metadata");
        cmd.arg(format!("copyright={}", self.options.copyright));
        cmd.arg("-metadata");
        cmd.arg(format!("comment={}", self.options.comment));

        // With a replacement audio input the spliced track becomes audio
        // stream 0 and the original track shifts to 1.
        let audio_stream = if replacement_audio.is_some() { "1" } else { "0" };
        cmd.arg(format!("-metadata:s:a:{}", audio_stream));
        cmd.arg(format!("title={}", self.options.audio_name));
        cmd.arg(format!("-metadata:s:a:{}", audio_stream));
        cmd.arg(format!("handler={}", self.options.audio_name));
        if replacement_audio.is_some() {
            cmd.args(["-metadata:s:a:0", "title=DD+"]);
            cmd.args(["-metadata:s:a:0", "handler=DD+"]);
        }

        if self.options.fast_start {
            cmd.args(["-movflags", "+faststart"]);
        }

        cmd.args(["-c", "copy", "-y"]);
        add_aac_filter(cmd, use_aac_filter);
        cmd.arg(output.to_string_lossy());
    }

    fn date_string(&self) -> String {
        self.options
            .record_time
            .clone()
            .unwrap_or_else(|| Local::now().to_rfc3339())
    }
}

fn add_aac_filter(cmd: &mut ToolCommand, enabled: bool) {
    if enabled {
        cmd.args(["-bsf:a", "aac_adtstoasc"]);
    }
}

/// Write a concat-demuxer manifest listing each segment on its own line.
///
/// The manifest must outlive the builder so the external tool can read it;
/// the temp file is persisted and its path returned.
fn write_concat_manifest(segments: &[PathBuf]) -> Result<PathBuf, MuxError> {
    let mut file = tempfile::Builder::new()
        .prefix("segmux-concat-")
        .suffix(".txt")
        .tempfile()?;

    for segment in segments {
        writeln!(file, "file '{}'", segment.display())?;
    }
    file.flush()?;

    let (_, path) = file.keep().map_err(|e| MuxError::Io(e.error))?;
    Ok(path)
}
