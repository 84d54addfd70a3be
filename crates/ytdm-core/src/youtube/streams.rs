//! Stream manifest model: containers, qualities, and source streams.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target file format for a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    WebM,
    Mp3,
    Ogg,
}

impl Container {
    /// Whether this container can only hold audio.
    pub fn is_audio_only(self) -> bool {
        matches!(self, Container::Mp3 | Container::Ogg)
    }

    /// File extension without the leading dot.
    pub fn ext(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::WebM => "webm",
            Container::Mp3 => "mp3",
            Container::Ogg => "ogg",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ext())
    }
}

impl FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" | "m4a" => Ok(Container::Mp4),
            "webm" => Ok(Container::WebM),
            "mp3" => Ok(Container::Mp3),
            "ogg" | "opus" => Ok(Container::Ogg),
            other => Err(format!("unknown container: {other}")),
        }
    }
}

/// Video quality of a stream. Ordering is lexicographic by height, then
/// framerate, which matches the preference matcher's ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VideoQuality {
    pub height: u32,
    pub framerate: u32,
}

impl VideoQuality {
    pub fn new(height: u32, framerate: u32) -> Self {
        Self { height, framerate }
    }

    /// Human-readable label, e.g. `1080p` or `720p60`.
    pub fn label(&self) -> String {
        if self.framerate > 30 {
            format!("{}p{}", self.height, self.framerate)
        } else {
            format!("{}p", self.height)
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Audio track language info carried by audio-only streams.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioTrack {
    /// BCP-47-ish language code, e.g. `en` or `es-419`. None for untagged tracks.
    pub language: Option<String>,
    /// Whether this is the default track of the video (the "primary" language).
    pub is_default: bool,
}

impl AudioTrack {
    pub fn default_track() -> Self {
        Self {
            language: None,
            is_default: true,
        }
    }
}

/// One source stream in a manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamInfo {
    /// Single stream containing both audio and video.
    Muxed {
        format_id: String,
        container: Container,
        quality: VideoQuality,
        bitrate: u64,
    },
    /// Video-only stream; must be paired with an audio stream.
    VideoOnly {
        format_id: String,
        container: Container,
        quality: VideoQuality,
        bitrate: u64,
    },
    /// Audio-only stream.
    AudioOnly {
        format_id: String,
        container: Container,
        bitrate: u64,
        track: AudioTrack,
    },
}

impl StreamInfo {
    pub fn format_id(&self) -> &str {
        match self {
            StreamInfo::Muxed { format_id, .. }
            | StreamInfo::VideoOnly { format_id, .. }
            | StreamInfo::AudioOnly { format_id, .. } => format_id,
        }
    }

    pub fn container(&self) -> Container {
        match self {
            StreamInfo::Muxed { container, .. }
            | StreamInfo::VideoOnly { container, .. }
            | StreamInfo::AudioOnly { container, .. } => *container,
        }
    }

    pub fn bitrate(&self) -> u64 {
        match self {
            StreamInfo::Muxed { bitrate, .. }
            | StreamInfo::VideoOnly { bitrate, .. }
            | StreamInfo::AudioOnly { bitrate, .. } => *bitrate,
        }
    }

    /// Video quality, if this stream carries video.
    pub fn video_quality(&self) -> Option<VideoQuality> {
        match self {
            StreamInfo::Muxed { quality, .. } | StreamInfo::VideoOnly { quality, .. } => {
                Some(*quality)
            }
            StreamInfo::AudioOnly { .. } => None,
        }
    }

    /// Audio track info, if this is an audio-only stream.
    pub fn audio_track(&self) -> Option<&AudioTrack> {
        match self {
            StreamInfo::AudioOnly { track, .. } => Some(track),
            _ => None,
        }
    }
}

/// The set of available source streams for a video.
#[derive(Debug, Clone, Default)]
pub struct StreamManifest {
    pub streams: Vec<StreamInfo>,
}

impl StreamManifest {
    pub fn muxed(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams
            .iter()
            .filter(|s| matches!(s, StreamInfo::Muxed { .. }))
    }

    pub fn video_only(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams
            .iter()
            .filter(|s| matches!(s, StreamInfo::VideoOnly { .. }))
    }

    pub fn audio_only(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams
            .iter()
            .filter(|s| matches!(s, StreamInfo::AudioOnly { .. }))
    }
}

/// One closed caption track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language: String,
    pub is_auto_generated: bool,
}

/// The set of available caption tracks for a video.
#[derive(Debug, Clone, Default)]
pub struct CaptionManifest {
    pub tracks: Vec<CaptionTrack>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_audio_only_flag() {
        assert!(!Container::Mp4.is_audio_only());
        assert!(!Container::WebM.is_audio_only());
        assert!(Container::Mp3.is_audio_only());
        assert!(Container::Ogg.is_audio_only());
    }

    #[test]
    fn container_from_str() {
        assert_eq!("mp4".parse::<Container>().unwrap(), Container::Mp4);
        assert_eq!("WEBM".parse::<Container>().unwrap(), Container::WebM);
        assert_eq!("m4a".parse::<Container>().unwrap(), Container::Mp4);
        assert!("mkv".parse::<Container>().is_err());
    }

    #[test]
    fn quality_ordering_is_height_then_framerate() {
        let q480 = VideoQuality::new(480, 30);
        let q720 = VideoQuality::new(720, 30);
        let q720_60 = VideoQuality::new(720, 60);
        assert!(q480 < q720);
        assert!(q720 < q720_60);
    }

    #[test]
    fn quality_label() {
        assert_eq!(VideoQuality::new(1080, 30).label(), "1080p");
        assert_eq!(VideoQuality::new(720, 60).label(), "720p60");
    }
}
