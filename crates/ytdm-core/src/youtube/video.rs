//! Read-only video metadata owned by the extraction collaborator.

use std::time::Duration;

use super::ids::VideoId;

/// A thumbnail image of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Metadata for one video, as resolved by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    pub author: String,
    /// None for live streams and flat playlist entries without duration info.
    pub duration: Option<Duration>,
    pub thumbnails: Vec<Thumbnail>,
}

impl Video {
    /// Highest-resolution thumbnail, if any.
    pub fn best_thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnails.iter().max_by_key(|t| t.width * t.height)
    }
}
