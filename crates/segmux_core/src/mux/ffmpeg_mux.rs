//! ffmpeg command builder for the multi-track mux path.
//!
//! Many finished track files go in, one container comes out. The delicate
//! part is addressing per-stream metadata at the correct *output* stream
//! index: an input that itself carries several streams shifts the index of
//! every stream after it, so a per-descriptor counter is wrong the moment
//! any descriptor embeds more than one stream.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::lang::LanguageNormalizer;
use crate::models::{ContainerFormat, MediaKind, OutputTrack};

use super::{MuxError, ToolCommand};

/// Builder for the ffmpeg multi-track mux invocation.
pub struct FfmpegMuxBuilder<'a> {
    binary: &'a Path,
    tracks: &'a [OutputTrack],
    output_stem: &'a Path,
    format: ContainerFormat,
    write_date: bool,
}

impl<'a> FfmpegMuxBuilder<'a> {
    /// Create a new mux builder.
    ///
    /// `output_stem` is the output path without extension; the container
    /// format picks the extension. Track order fixes input and output
    /// stream indices.
    pub fn new(
        binary: &'a Path,
        tracks: &'a [OutputTrack],
        output_stem: &'a Path,
        format: ContainerFormat,
    ) -> Self {
        Self {
            binary,
            tracks,
            output_stem,
            format,
            write_date: false,
        }
    }

    /// Write a `date` metadata field into the container.
    pub fn with_date_metadata(mut self, write_date: bool) -> Self {
        self.write_date = write_date;
        self
    }

    /// Build the complete ffmpeg command.
    ///
    /// Unsupported containers are rejected here, before anything is
    /// spawned. The normalizer runs once per descriptor before its
    /// metadata directives are emitted.
    pub fn build(&self, normalizer: &dyn LanguageNormalizer) -> Result<ToolCommand, MuxError> {
        let mut cmd = ToolCommand::new(self.binary);
        cmd.args(["-loglevel", "warning", "-nostdin", "-y", "-dn"]);

        for track in self.tracks {
            cmd.arg("-i");
            cmd.arg(track.path.to_string_lossy());
        }
        for index in 0..self.tracks.len() {
            cmd.arg("-map");
            cmd.arg(index.to_string());
        }

        self.add_codec_flags(&mut cmd)?;

        // Strip inherited container metadata, then re-tag per stream.
        cmd.args(["-map_metadata", "-1"]);
        self.add_stream_metadata(&mut cmd, normalizer);
        self.add_dispositions(&mut cmd);

        if self.write_date {
            cmd.arg("-metadata");
            cmd.arg(format!("date={}", Local::now().to_rfc3339()));
        }
        cmd.args(["-ignore_unknown", "-copy_unknown"]);

        let mut output = self.output_stem.as_os_str().to_os_string();
        output.push(".");
        output.push(self.format.extension());
        cmd.arg(PathBuf::from(output).to_string_lossy());

        tracing::debug!("Built mux command: {}", cmd.display_line());
        Ok(cmd)
    }

    fn add_codec_flags(&self, cmd: &mut ToolCommand) -> Result<(), MuxError> {
        match self.format {
            ContainerFormat::Mp4 => {
                // MP4 has no native support for the downloaded text
                // subtitle codecs; they are remuxed as mov_text.
                cmd.args(["-strict", "unofficial", "-c:a", "copy", "-c:v", "copy"]);
                cmd.args(["-c:s", "mov_text"]);
            }
            ContainerFormat::Ts => {
                cmd.args(["-strict", "unofficial", "-c:a", "copy", "-c:v", "copy"]);
            }
            ContainerFormat::Mkv => {
                let srt = self.tracks.iter().any(|t| {
                    t.path
                        .extension()
                        .is_some_and(|e| e.eq_ignore_ascii_case("srt"))
                });
                cmd.args(["-strict", "unofficial", "-c:a", "copy", "-c:v", "copy"]);
                cmd.args(["-c:s", if srt { "srt" } else { "webvtt" }]);
            }
            other => return Err(MuxError::UnsupportedFormat(other)),
        }
        Ok(())
    }

    fn add_stream_metadata(&self, cmd: &mut ToolCommand, normalizer: &dyn LanguageNormalizer) {
        // -metadata:s:N addresses the Nth *output* stream. The counter
        // advances by each descriptor's embedded stream count, never by one.
        let mut stream_index = 0usize;
        for track in self.tracks {
            let mut track = track.clone();
            normalizer.normalize(&mut track);

            cmd.arg(format!("-metadata:s:{}", stream_index));
            cmd.arg(format!("language={}", track.lang_code()));
            if let Some(title) = track.title.as_deref().filter(|t| !t.is_empty()) {
                cmd.arg(format!("-metadata:s:{}", stream_index));
                cmd.arg(format!("title={}", title));
            }

            stream_index += track.output_streams();
        }
    }

    fn add_dispositions(&self, cmd: &mut ToolCommand) {
        let has_video = self.tracks.iter().any(|t| t.kind.is_video_like());
        let has_subtitles = self
            .tracks
            .iter()
            .any(|t| t.kind == MediaKind::Subtitles);
        let audio_count = self
            .tracks
            .iter()
            .filter(|t| t.kind == MediaKind::Audio)
            .count();

        if has_video {
            cmd.args(["-disposition:v:0", "default"]);
        }
        // Subtitles never win default selection.
        if has_subtitles {
            cmd.args(["-disposition:s", "0"]);
        }
        if audio_count > 0 {
            cmd.args(["-disposition:a:0", "default"]);
            for index in 1..audio_count {
                cmd.arg(format!("-disposition:a:{}", index));
                cmd.arg("0");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{FnNormalizer, Identity};

    fn build(tracks: &[OutputTrack], format: ContainerFormat) -> ToolCommand {
        FfmpegMuxBuilder::new(Path::new("ffmpeg"), tracks, Path::new("/out/show"), format)
            .build(&Identity)
            .unwrap()
    }

    fn has_pair(cmd: &ToolCommand, flag: &str, value: &str) -> bool {
        cmd.args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn maps_every_input_in_order() {
        let tracks = vec![
            OutputTrack::new("/t/video.mp4", MediaKind::Video),
            OutputTrack::new("/t/audio.m4a", MediaKind::Audio),
        ];
        let cmd = build(&tracks, ContainerFormat::Mkv);

        assert!(has_pair(&cmd, "-i", "/t/video.mp4"));
        assert!(has_pair(&cmd, "-i", "/t/audio.m4a"));
        assert!(has_pair(&cmd, "-map", "0"));
        assert!(has_pair(&cmd, "-map", "1"));
        assert_eq!(cmd.args.last().unwrap(), "/out/show.mkv");
    }

    #[test]
    fn stream_index_advances_by_embedded_stream_count() {
        let tracks = vec![
            OutputTrack::new("/t/a.mp4", MediaKind::Video).with_lang("und"),
            OutputTrack::new("/t/b.mp4", MediaKind::Video).with_stream_count(3),
            OutputTrack::new("/t/c.m4a", MediaKind::Audio)
                .with_lang("jpn")
                .with_title("Japanese"),
        ];
        let cmd = build(&tracks, ContainerFormat::Mkv);

        // Third descriptor lands at output stream 1 + 3 = 4, not at index 2.
        assert!(has_pair(&cmd, "-metadata:s:0", "language=und"));
        assert!(has_pair(&cmd, "-metadata:s:1", "language=und"));
        assert!(has_pair(&cmd, "-metadata:s:4", "language=jpn"));
        assert!(has_pair(&cmd, "-metadata:s:4", "title=Japanese"));
        assert!(!cmd.args.iter().any(|a| a == "-metadata:s:2"));
    }

    #[test]
    fn trailing_descriptor_after_multi_stream_inputs() {
        // Embedded counts [1, 3, 1]: the third descriptor's metadata must
        // target output stream 5.
        let tracks = vec![
            OutputTrack::new("/t/a.mp4", MediaKind::Video),
            OutputTrack::new("/t/b.mp4", MediaKind::Video).with_stream_count(3),
            OutputTrack::new("/t/c.m4a", MediaKind::Audio).with_lang("eng"),
            OutputTrack::new("/t/d.srt", MediaKind::Subtitles).with_lang("eng"),
        ];
        let cmd = build(&tracks, ContainerFormat::Mkv);

        assert!(has_pair(&cmd, "-metadata:s:4", "language=eng"));
        assert!(has_pair(&cmd, "-metadata:s:5", "language=eng"));
    }

    #[test]
    fn disposition_matrix() {
        let tracks = vec![
            OutputTrack::new("/t/v.mp4", MediaKind::Video),
            OutputTrack::new("/t/a1.m4a", MediaKind::Audio),
            OutputTrack::new("/t/a2.m4a", MediaKind::Audio),
            OutputTrack::new("/t/a3.m4a", MediaKind::Audio),
            OutputTrack::new("/t/s1.srt", MediaKind::Subtitles),
            OutputTrack::new("/t/s2.srt", MediaKind::Subtitles),
        ];
        let cmd = build(&tracks, ContainerFormat::Mkv);

        assert!(has_pair(&cmd, "-disposition:v:0", "default"));
        assert!(has_pair(&cmd, "-disposition:s", "0"));
        assert!(has_pair(&cmd, "-disposition:a:0", "default"));
        assert!(has_pair(&cmd, "-disposition:a:1", "0"));
        assert!(has_pair(&cmd, "-disposition:a:2", "0"));
        // Exactly one default video and one default audio.
        assert_eq!(cmd.args.iter().filter(|a| *a == "default").count(), 2);
    }

    #[test]
    fn audio_only_set_has_no_video_disposition() {
        let tracks = vec![
            OutputTrack::new("/t/a1.m4a", MediaKind::Audio),
            OutputTrack::new("/t/a2.m4a", MediaKind::Audio),
        ];
        let cmd = build(&tracks, ContainerFormat::Mkv);

        assert!(!cmd.args.iter().any(|a| a == "-disposition:v:0"));
        assert!(has_pair(&cmd, "-disposition:a:0", "default"));
        assert!(has_pair(&cmd, "-disposition:a:1", "0"));
    }

    #[test]
    fn ts_mux_scenario_without_subtitle_codec() {
        // Two descriptors into a container without native subtitle support:
        // both inputs mapped, language and title land on output stream 1,
        // video stream 0 is the default, and no subtitle codec directive
        // appears.
        let tracks = vec![
            OutputTrack::new("/t/video.ts", MediaKind::Video),
            OutputTrack::new("/t/audio.m4a", MediaKind::Audio)
                .with_lang("eng")
                .with_title("English"),
        ];
        let cmd = build(&tracks, ContainerFormat::Ts);

        assert!(has_pair(&cmd, "-map", "0"));
        assert!(has_pair(&cmd, "-map", "1"));
        assert!(has_pair(&cmd, "-metadata:s:1", "language=eng"));
        assert!(has_pair(&cmd, "-metadata:s:1", "title=English"));
        assert!(has_pair(&cmd, "-metadata:s:0", "language=und"));
        assert!(has_pair(&cmd, "-disposition:v:0", "default"));
        assert!(!cmd.args.iter().any(|a| a == "-c:s"));
    }

    #[test]
    fn mkv_subtitle_codec_follows_inputs() {
        let vtt_tracks = vec![
            OutputTrack::new("/t/video.mp4", MediaKind::Video),
            OutputTrack::new("/t/subs.vtt", MediaKind::Subtitles),
        ];
        let cmd = build(&vtt_tracks, ContainerFormat::Mkv);
        assert!(has_pair(&cmd, "-c:s", "webvtt"));

        let srt_tracks = vec![
            OutputTrack::new("/t/video.mp4", MediaKind::Video),
            OutputTrack::new("/t/subs.srt", MediaKind::Subtitles),
        ];
        let cmd = build(&srt_tracks, ContainerFormat::Mkv);
        assert!(has_pair(&cmd, "-c:s", "srt"));
    }

    #[test]
    fn mp4_remuxes_subtitles_as_mov_text() {
        let tracks = vec![
            OutputTrack::new("/t/video.mp4", MediaKind::Video),
            OutputTrack::new("/t/subs.srt", MediaKind::Subtitles),
        ];
        let cmd = build(&tracks, ContainerFormat::Mp4);
        assert!(has_pair(&cmd, "-c:s", "mov_text"));
        assert!(has_pair(&cmd, "-map_metadata", "-1"));
    }

    #[test]
    fn rejects_containers_without_mux_support() {
        let tracks = vec![OutputTrack::new("/t/video.mp4", MediaKind::Video)];
        let err = FfmpegMuxBuilder::new(
            Path::new("ffmpeg"),
            &tracks,
            Path::new("/out/show"),
            ContainerFormat::Flv,
        )
        .build(&Identity)
        .unwrap_err();

        assert!(matches!(
            err,
            MuxError::UnsupportedFormat(ContainerFormat::Flv)
        ));
    }

    #[test]
    fn normalizer_runs_before_metadata() {
        let tracks = vec![OutputTrack::new("/t/audio.m4a", MediaKind::Audio).with_lang("en")];
        let normalizer = FnNormalizer(|track: &mut OutputTrack| {
            track.lang = Some("eng".to_string());
            track.title.get_or_insert_with(|| "English".to_string());
        });
        let cmd = FfmpegMuxBuilder::new(
            Path::new("ffmpeg"),
            &tracks,
            Path::new("/out/show"),
            ContainerFormat::Mkv,
        )
        .build(&normalizer)
        .unwrap();

        assert!(has_pair(&cmd, "-metadata:s:0", "language=eng"));
        assert!(has_pair(&cmd, "-metadata:s:0", "title=English"));
    }
}
