//! The `MediaExtractor` trait and its error taxonomy.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::ids::{ChannelId, PlaylistId, VideoId};
use super::streams::{CaptionManifest, CaptionTrack, StreamInfo, StreamManifest};
use super::video::Video;

/// Progress callback for transfers; receives a fraction in [0, 1].
pub type ProgressFn<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// Errors surfaced by the extraction collaborator.
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("video {0} is unavailable")]
    VideoUnavailable(VideoId),

    #[error("playlist {0} is unavailable")]
    PlaylistUnavailable(PlaylistId),

    #[error("channel {0} is unavailable")]
    ChannelUnavailable(ChannelId),

    #[error("no results found for `{0}`")]
    NotFound(String),

    #[error("operation canceled")]
    Canceled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The external tool failed in a way we can only report verbatim.
    #[error("{tool}: {message}")]
    Tool { tool: String, message: String },
}

/// A resolved playlist: title plus the videos it contains, in playlist order.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub id: PlaylistId,
    pub title: String,
    pub videos: Vec<Video>,
}

/// A resolved channel: title plus its uploads, newest first.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    pub title: String,
    pub videos: Vec<Video>,
}

/// Black-box media extraction collaborator.
///
/// Implementations perform the actual metadata lookups and byte transfers.
/// `download` must honor the cancellation token promptly and report progress
/// in [0, 1] through the sink when one is supplied.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    async fn video(&self, id: &VideoId) -> Result<Video, ExtractorError>;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Video>, ExtractorError>;

    async fn playlist(&self, id: &PlaylistId) -> Result<Playlist, ExtractorError>;

    async fn channel_uploads(&self, id: &ChannelId) -> Result<Channel, ExtractorError>;

    async fn manifest(&self, id: &VideoId) -> Result<StreamManifest, ExtractorError>;

    async fn caption_manifest(&self, id: &VideoId) -> Result<CaptionManifest, ExtractorError>;

    /// Streams the given sources into `dest`, muxing into the target container
    /// implied by the file extension. Captions, when given, are embedded.
    async fn download(
        &self,
        video: &VideoId,
        streams: &[StreamInfo],
        captions: &[CaptionTrack],
        dest: &Path,
        progress: Option<ProgressFn<'_>>,
        cancel: &CancellationToken,
    ) -> Result<(), ExtractorError>;
}
