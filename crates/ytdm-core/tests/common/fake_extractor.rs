//! Scripted in-memory `MediaExtractor` for integration tests.
//!
//! Behavior is configured up front (videos, playlists, search results,
//! failures) and can be adjusted mid-test through the shared handles, e.g. to
//! let a download fail once and succeed after a restart. Downloads write a
//! marker file so tests can assert on partial-file cleanup.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use ytdm_core::youtube::{
    AudioTrack, CaptionManifest, CaptionTrack, Channel, ChannelId, Container, ExtractorError,
    MediaExtractor, Playlist, PlaylistId, ProgressFn, StreamInfo, StreamManifest, Video,
    VideoId, VideoQuality,
};

pub const PARTIAL_MARKER: &[u8] = b"partial";
pub const COMPLETE_MARKER: &[u8] = b"complete";

/// Builds a test video with the given 11-character id.
pub fn make_video(id: &str, title: &str) -> Video {
    Video {
        id: VideoId::try_parse(id).expect("valid test video id"),
        title: title.to_string(),
        author: "Test Channel".to_string(),
        duration: None,
        thumbnails: Vec::new(),
    }
}

/// A manifest with one muxed mp4, one video-only mp4, and one default-track
/// audio stream, enough to satisfy any container preference.
pub fn simple_manifest() -> StreamManifest {
    StreamManifest {
        streams: vec![
            StreamInfo::Muxed {
                format_id: "18".to_string(),
                container: Container::Mp4,
                quality: VideoQuality::new(360, 30),
                bitrate: 500_000,
            },
            StreamInfo::VideoOnly {
                format_id: "137".to_string(),
                container: Container::Mp4,
                quality: VideoQuality::new(1080, 30),
                bitrate: 4_400_000,
            },
            StreamInfo::AudioOnly {
                format_id: "140".to_string(),
                container: Container::Mp4,
                bitrate: 128_000,
                track: AudioTrack::default_track(),
            },
        ],
    }
}

pub struct FakeExtractor {
    videos: HashMap<String, Video>,
    unavailable: HashSet<String>,
    playlists: HashMap<String, (String, Vec<Video>)>,
    searches: HashMap<String, Vec<Video>>,
    manifest: StreamManifest,
    fail_downloads: Mutex<HashSet<String>>,
    hold: Option<watch::Receiver<bool>>,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self {
            videos: HashMap::new(),
            unavailable: HashSet::new(),
            playlists: HashMap::new(),
            searches: HashMap::new(),
            manifest: simple_manifest(),
            fail_downloads: Mutex::new(HashSet::new()),
            hold: None,
        }
    }

    pub fn with_video(mut self, video: Video) -> Self {
        self.videos.insert(video.id.as_str().to_string(), video);
        self
    }

    /// Marks a video id as unavailable for every lookup.
    pub fn with_unavailable(mut self, id: &str) -> Self {
        self.unavailable.insert(id.to_string());
        self
    }

    pub fn with_playlist(mut self, id: &str, title: &str, videos: Vec<Video>) -> Self {
        self.playlists
            .insert(id.to_string(), (title.to_string(), videos));
        self
    }

    pub fn with_search(mut self, term: &str, videos: Vec<Video>) -> Self {
        self.searches.insert(term.to_string(), videos);
        self
    }

    /// Makes transfers for this video fail until [`clear_download_failure`].
    pub fn with_failing_download(self, id: &str) -> Self {
        self.fail_downloads.lock().unwrap().insert(id.to_string());
        self
    }

    pub fn clear_download_failure(&self, id: &str) {
        self.fail_downloads.lock().unwrap().remove(id);
    }

    /// Parks every download after its partial write until the returned sender
    /// publishes `true` (or the download is canceled).
    pub fn with_hold(mut self) -> (Self, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        self.hold = Some(rx);
        (self, tx)
    }

    fn lookup_video(&self, id: &VideoId) -> Result<Video, ExtractorError> {
        if self.unavailable.contains(id.as_str()) {
            return Err(ExtractorError::VideoUnavailable(id.clone()));
        }
        self.videos
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ExtractorError::VideoUnavailable(id.clone()))
    }
}

#[async_trait]
impl MediaExtractor for FakeExtractor {
    async fn video(&self, id: &VideoId) -> Result<Video, ExtractorError> {
        self.lookup_video(id)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Video>, ExtractorError> {
        let mut results = self.searches.get(query).cloned().unwrap_or_default();
        results.truncate(limit);
        Ok(results)
    }

    async fn playlist(&self, id: &PlaylistId) -> Result<Playlist, ExtractorError> {
        let (title, videos) = self
            .playlists
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ExtractorError::PlaylistUnavailable(id.clone()))?;
        Ok(Playlist {
            id: id.clone(),
            title,
            videos,
        })
    }

    async fn channel_uploads(&self, id: &ChannelId) -> Result<Channel, ExtractorError> {
        Err(ExtractorError::ChannelUnavailable(id.clone()))
    }

    async fn manifest(&self, id: &VideoId) -> Result<StreamManifest, ExtractorError> {
        self.lookup_video(id)?;
        Ok(self.manifest.clone())
    }

    async fn caption_manifest(&self, id: &VideoId) -> Result<CaptionManifest, ExtractorError> {
        self.lookup_video(id)?;
        Ok(CaptionManifest {
            tracks: vec![CaptionTrack {
                language: "en".to_string(),
                is_auto_generated: false,
            }],
        })
    }

    async fn download(
        &self,
        video: &VideoId,
        _streams: &[StreamInfo],
        _captions: &[CaptionTrack],
        dest: &Path,
        progress: Option<ProgressFn<'_>>,
        cancel: &CancellationToken,
    ) -> Result<(), ExtractorError> {
        tokio::fs::write(dest, PARTIAL_MARKER).await?;
        if let Some(report) = progress {
            report(0.25);
        }

        if let Some(hold) = &self.hold {
            let mut hold = hold.clone();
            tokio::select! {
                _ = hold.wait_for(|released| *released) => {}
                _ = cancel.cancelled() => return Err(ExtractorError::Canceled),
            }
        }
        if cancel.is_cancelled() {
            return Err(ExtractorError::Canceled);
        }

        if self.fail_downloads.lock().unwrap().contains(video.as_str()) {
            return Err(ExtractorError::Tool {
                tool: "fake".to_string(),
                message: "simulated transfer failure".to_string(),
            });
        }

        tokio::fs::write(dest, COMPLETE_MARKER).await?;
        if let Some(report) = progress {
            report(1.0);
        }
        Ok(())
    }
}
