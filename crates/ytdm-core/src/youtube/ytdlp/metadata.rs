//! Serde model for the yt-dlp `-J` metadata dump and its mapping into the
//! engine's stream/video types.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::youtube::ids::VideoId;
use crate::youtube::streams::{
    AudioTrack, CaptionManifest, CaptionTrack, Container, StreamInfo, StreamManifest, VideoQuality,
};
use crate::youtube::video::{Thumbnail, Video};

#[derive(Debug, Deserialize)]
pub(super) struct VideoJson {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnails: Vec<ThumbnailJson>,
    #[serde(default)]
    pub formats: Vec<FormatJson>,
    #[serde(default)]
    pub subtitles: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub automatic_captions: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ThumbnailJson {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FormatJson {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<f64>,
    /// Total bitrate in kbps.
    #[serde(default)]
    pub tbr: Option<f64>,
    /// Audio bitrate in kbps.
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub language_preference: Option<i64>,
}

/// Flat-playlist dump: used for playlists, channel tabs, and searches.
#[derive(Debug, Deserialize)]
pub(super) struct PlaylistJson {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryJson>,
}

#[derive(Debug, Deserialize)]
pub(super) struct EntryJson {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl VideoJson {
    pub(super) fn to_video(&self) -> Option<Video> {
        let id = VideoId::try_parse(&self.id)?;
        Some(Video {
            id,
            title: self.title.clone().unwrap_or_else(|| self.id.clone()),
            author: self
                .uploader
                .clone()
                .or_else(|| self.channel.clone())
                .unwrap_or_default(),
            duration: self.duration.map(Duration::from_secs_f64),
            thumbnails: self
                .thumbnails
                .iter()
                .map(|t| Thumbnail {
                    url: t.url.clone(),
                    width: t.width.unwrap_or(0),
                    height: t.height.unwrap_or(0),
                })
                .collect(),
        })
    }

    pub(super) fn to_manifest(&self) -> StreamManifest {
        StreamManifest {
            streams: self.formats.iter().filter_map(FormatJson::to_stream).collect(),
        }
    }

    pub(super) fn to_caption_manifest(&self) -> CaptionManifest {
        let mut tracks: Vec<CaptionTrack> = self
            .subtitles
            .keys()
            .map(|lang| CaptionTrack {
                language: lang.clone(),
                is_auto_generated: false,
            })
            .collect();
        tracks.extend(
            self.automatic_captions
                .keys()
                .filter(|lang| !self.subtitles.contains_key(*lang))
                .map(|lang| CaptionTrack {
                    language: lang.clone(),
                    is_auto_generated: true,
                }),
        );
        CaptionManifest { tracks }
    }
}

impl FormatJson {
    fn to_stream(&self) -> Option<StreamInfo> {
        let has_video = self.vcodec.as_deref().is_some_and(|v| v != "none");
        let has_audio = self.acodec.as_deref().is_some_and(|a| a != "none");
        let container: Container = self.ext.as_deref()?.parse().ok()?;
        let bitrate = (self.tbr.or(self.abr).unwrap_or(0.0) * 1000.0) as u64;

        match (has_video, has_audio) {
            (true, true) => Some(StreamInfo::Muxed {
                format_id: self.format_id.clone(),
                container,
                quality: self.quality()?,
                bitrate,
            }),
            (true, false) => Some(StreamInfo::VideoOnly {
                format_id: self.format_id.clone(),
                container,
                quality: self.quality()?,
                bitrate,
            }),
            (false, true) => Some(StreamInfo::AudioOnly {
                format_id: self.format_id.clone(),
                container,
                bitrate,
                track: AudioTrack {
                    language: self.language.clone(),
                    // yt-dlp marks the original/default track with a
                    // non-negative language preference.
                    is_default: self.language_preference.map(|p| p >= 0).unwrap_or(true),
                },
            }),
            (false, false) => None,
        }
    }

    fn quality(&self) -> Option<VideoQuality> {
        Some(VideoQuality::new(
            self.height?,
            self.fps.map(|f| f.round() as u32).unwrap_or(30),
        ))
    }
}

impl EntryJson {
    pub(super) fn to_video(&self) -> Option<Video> {
        let id = VideoId::try_parse(self.id.as_deref()?)?;
        Some(Video {
            title: self.title.clone().unwrap_or_else(|| id.as_str().to_string()),
            author: self
                .uploader
                .clone()
                .or_else(|| self.channel.clone())
                .unwrap_or_default(),
            duration: self.duration.map(Duration::from_secs_f64),
            thumbnails: Vec::new(),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_formats_to_streams() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Test",
            "uploader": "Someone",
            "duration": 212.0,
            "formats": [
                {"format_id": "18", "ext": "mp4", "vcodec": "avc1", "acodec": "mp4a", "height": 360, "tbr": 500.0},
                {"format_id": "137", "ext": "mp4", "vcodec": "avc1", "acodec": "none", "height": 1080, "fps": 29.97, "tbr": 4400.0},
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a", "abr": 128.0, "language": "en", "language_preference": 10},
                {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none"}
            ]
        }"#;
        let parsed: VideoJson = serde_json::from_str(json).unwrap();

        let video = parsed.to_video().unwrap();
        assert_eq!(video.title, "Test");
        assert_eq!(video.author, "Someone");

        let manifest = parsed.to_manifest();
        assert_eq!(manifest.streams.len(), 3, "storyboard format is dropped");
        assert!(matches!(&manifest.streams[0], StreamInfo::Muxed { quality, .. } if quality.height == 360));
        assert!(matches!(&manifest.streams[1], StreamInfo::VideoOnly { quality, .. } if quality.framerate == 30));
        match &manifest.streams[2] {
            StreamInfo::AudioOnly { track, container, .. } => {
                assert_eq!(track.language.as_deref(), Some("en"));
                assert!(track.is_default);
                assert_eq!(*container, Container::Mp4);
            }
            other => panic!("expected audio stream, got {other:?}"),
        }
    }

    #[test]
    fn caption_manifest_prefers_manual_tracks() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "subtitles": {"en": []},
            "automatic_captions": {"en": [], "de": []}
        }"#;
        let parsed: VideoJson = serde_json::from_str(json).unwrap();
        let captions = parsed.to_caption_manifest();
        assert_eq!(captions.tracks.len(), 2);
        let en = captions.tracks.iter().find(|t| t.language == "en").unwrap();
        assert!(!en.is_auto_generated);
        let de = captions.tracks.iter().find(|t| t.language == "de").unwrap();
        assert!(de.is_auto_generated);
    }

    #[test]
    fn flat_entries_become_videos() {
        let json = r#"{
            "title": "Some playlist",
            "entries": [
                {"id": "dQw4w9WgXcQ", "title": "One", "channel": "C"},
                {"id": null, "title": "deleted video"}
            ]
        }"#;
        let parsed: PlaylistJson = serde_json::from_str(json).unwrap();
        let videos: Vec<_> = parsed.entries.iter().filter_map(EntryJson::to_video).collect();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].author, "C");
    }
}
