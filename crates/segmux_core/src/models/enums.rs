//! Core enums used throughout the crate.

use serde::{Deserialize, Serialize};

/// Kind of media carried by a finished track file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Subtitles,
    /// Anything else (data tracks, images, unknown payloads).
    Other,
}

impl MediaKind {
    /// Whether this track competes for the default video disposition.
    ///
    /// Muxers classify everything that is not audio and not subtitles into
    /// the video stream group, so `Other` counts as video here.
    pub fn is_video_like(self) -> bool {
        !matches!(self, MediaKind::Audio | MediaKind::Subtitles)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Subtitles => write!(f, "subtitles"),
            MediaKind::Other => write!(f, "other"),
        }
    }
}

/// Target container format for merge and mux output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Mp4,
    Mkv,
    Flv,
    M4a,
    Ts,
    Eac3,
    Aac,
    Ac3,
}

impl ContainerFormat {
    /// File extension appended to the output stem (no leading dot).
    pub fn extension(self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Mkv => "mkv",
            ContainerFormat::Flv => "flv",
            // AAC output is boxed into an m4a container as-is.
            ContainerFormat::M4a | ContainerFormat::Aac => "m4a",
            ContainerFormat::Ts => "ts",
            ContainerFormat::Eac3 => "eac3",
            ContainerFormat::Ac3 => "ac3",
        }
    }

    /// Whether the multi-track mux path can produce this container.
    ///
    /// The mux path only targets full containers; elementary-stream formats
    /// are merge-only.
    pub fn supports_track_mux(self) -> bool {
        matches!(
            self,
            ContainerFormat::Mp4 | ContainerFormat::Ts | ContainerFormat::Mkv
        )
    }

    /// Get all formats accepted by the simple merge path.
    pub fn all() -> &'static [ContainerFormat] {
        &[
            Self::Mp4,
            Self::Mkv,
            Self::Flv,
            Self::M4a,
            Self::Ts,
            Self::Eac3,
            Self::Aac,
            Self::Ac3,
        ]
    }
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerFormat::Mp4 => write!(f, "mp4"),
            ContainerFormat::Mkv => write!(f, "mkv"),
            ContainerFormat::Flv => write!(f, "flv"),
            ContainerFormat::M4a => write!(f, "m4a"),
            ContainerFormat::Ts => write!(f, "ts"),
            ContainerFormat::Eac3 => write!(f, "eac3"),
            ContainerFormat::Aac => write!(f, "aac"),
            ContainerFormat::Ac3 => write!(f, "ac3"),
        }
    }
}

/// Error for container format names this crate does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown container format: {0}")]
pub struct UnknownFormat(pub String);

impl std::str::FromStr for ContainerFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MP4" => Ok(Self::Mp4),
            "MKV" => Ok(Self::Mkv),
            "FLV" => Ok(Self::Flv),
            "M4A" => Ok(Self::M4a),
            "TS" => Ok(Self::Ts),
            "EAC3" => Ok(Self::Eac3),
            "AAC" => Ok(Self::Aac),
            "AC3" => Ok(Self::Ac3),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_serializes_lowercase() {
        let json = serde_json::to_string(&MediaKind::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
    }

    #[test]
    fn other_counts_as_video() {
        assert!(MediaKind::Video.is_video_like());
        assert!(MediaKind::Other.is_video_like());
        assert!(!MediaKind::Audio.is_video_like());
        assert!(!MediaKind::Subtitles.is_video_like());
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(ContainerFormat::Mp4.extension(), "mp4");
        assert_eq!(ContainerFormat::Aac.extension(), "m4a");
        assert_eq!(ContainerFormat::M4a.extension(), "m4a");
        assert_eq!(ContainerFormat::Eac3.extension(), "eac3");
    }

    #[test]
    fn parses_case_insensitive() {
        assert_eq!("mp4".parse::<ContainerFormat>().unwrap(), ContainerFormat::Mp4);
        assert_eq!("MKV".parse::<ContainerFormat>().unwrap(), ContainerFormat::Mkv);
        assert_eq!("eAc3".parse::<ContainerFormat>().unwrap(), ContainerFormat::Eac3);
    }

    #[test]
    fn unknown_format_is_error() {
        let err = "webm".parse::<ContainerFormat>().unwrap_err();
        assert_eq!(err, UnknownFormat("webm".to_string()));
    }

    #[test]
    fn only_full_containers_support_track_mux() {
        assert!(ContainerFormat::Mp4.supports_track_mux());
        assert!(ContainerFormat::Ts.supports_track_mux());
        assert!(ContainerFormat::Mkv.supports_track_mux());
        assert!(!ContainerFormat::Flv.supports_track_mux());
        assert!(!ContainerFormat::Aac.supports_track_mux());
    }
}
