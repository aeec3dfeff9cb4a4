//! Descriptors for finished per-track files awaiting multiplexing.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::MediaKind;

/// A finished track file plus the metadata the muxer needs for it.
///
/// The order of descriptors handed to a builder is significant: it fixes the
/// input index, the output stream index, and with those the targets of every
/// metadata and disposition directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTrack {
    /// Path to the finished track file.
    pub path: PathBuf,
    /// Kind of media in the file.
    pub kind: MediaKind,
    /// Language code; `None` renders as "und".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Human-readable title for the track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Number of streams embedded in this file.
    ///
    /// A single input can carry more than one stream (e.g. a video file with
    /// muxed-in audio); every stream it contributes shifts the output index
    /// of all later tracks.
    #[serde(default = "default_stream_count")]
    pub stream_count: usize,
}

fn default_stream_count() -> usize {
    1
}

impl OutputTrack {
    /// Create a descriptor with a default single embedded stream.
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            kind,
            lang: None,
            title: None,
            stream_count: default_stream_count(),
        }
    }

    /// Set the language code.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Set the track title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the embedded stream count.
    pub fn with_stream_count(mut self, count: usize) -> Self {
        self.stream_count = count;
        self
    }

    /// Language code for metadata directives, "und" when absent.
    pub fn lang_code(&self) -> &str {
        self.lang.as_deref().unwrap_or("und")
    }

    /// Streams this input contributes to the output.
    ///
    /// A probed count of zero still occupies one output stream.
    pub fn output_streams(&self) -> usize {
        self.stream_count.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_single_stream() {
        let track = OutputTrack::new("/tracks/audio.m4a", MediaKind::Audio);
        assert_eq!(track.stream_count, 1);
        assert_eq!(track.output_streams(), 1);
    }

    #[test]
    fn lang_code_falls_back_to_und() {
        let track = OutputTrack::new("/tracks/video.mp4", MediaKind::Video);
        assert_eq!(track.lang_code(), "und");

        let track = track.with_lang("eng");
        assert_eq!(track.lang_code(), "eng");
    }

    #[test]
    fn zero_stream_count_occupies_one_output_stream() {
        let track = OutputTrack::new("/tracks/video.mp4", MediaKind::Video).with_stream_count(0);
        assert_eq!(track.output_streams(), 1);
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let track: OutputTrack =
            serde_json::from_str(r#"{"path":"/t/a.m4a","kind":"audio"}"#).unwrap();
        assert_eq!(track.kind, MediaKind::Audio);
        assert_eq!(track.lang, None);
        assert_eq!(track.stream_count, 1);
    }
}
