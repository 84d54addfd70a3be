//! Contract with the media extraction collaborator.
//!
//! The engine never talks to YouTube's wire protocol itself: it resolves
//! queries and drives downloads through the [`MediaExtractor`] trait. The
//! bundled implementation shells out to the `yt-dlp` binary (see [`ytdlp`]);
//! tests substitute a scripted fake.

mod extractor;
mod ids;
mod streams;
mod video;
pub mod ytdlp;

pub use extractor::{Channel, ExtractorError, MediaExtractor, Playlist, ProgressFn};
pub use ids::{ChannelId, PlaylistId, VideoId};
pub use streams::{
    AudioTrack, CaptionManifest, CaptionTrack, Container, StreamInfo, StreamManifest, VideoQuality,
};
pub use video::{Thumbnail, Video};
