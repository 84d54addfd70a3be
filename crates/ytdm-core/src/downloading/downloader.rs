//! Downloads one video through the extraction collaborator.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::youtube::{MediaExtractor, ProgressFn, Video, VideoId};

use super::error::DownloadError;
use super::option::{resolve_options, DownloadOption};
use super::preference::DownloadPreference;

/// Facade over the extractor for option discovery and the actual transfer.
pub struct VideoDownloader {
    extractor: Arc<dyn MediaExtractor>,
}

impl VideoDownloader {
    pub fn new(extractor: Arc<dyn MediaExtractor>) -> Self {
        Self { extractor }
    }

    /// All downloadable options for the video, per [`resolve_options`].
    pub async fn options(
        &self,
        video_id: &VideoId,
        include_language_specific_audio: bool,
    ) -> Result<Vec<DownloadOption>, DownloadError> {
        let manifest = self.extractor.manifest(video_id).await?;
        resolve_options(&manifest, include_language_specific_audio)
    }

    /// Resolves the preference against the available options.
    pub async fn best_option(
        &self,
        video_id: &VideoId,
        preference: &DownloadPreference,
        include_language_specific_audio: bool,
        allow_container_fallback: bool,
    ) -> Result<DownloadOption, DownloadError> {
        let options = self
            .options(video_id, include_language_specific_audio)
            .await?;
        preference
            .best_option(&options, allow_container_fallback)
            .cloned()
            .ok_or(DownloadError::NoSuitableOption)
    }

    /// Streams the chosen option into `file_path`, embedding captions for
    /// video containers when requested. Progress fractions are forwarded to
    /// `progress`; the token cancels the transfer.
    pub async fn download(
        &self,
        file_path: &Path,
        video: &Video,
        option: &DownloadOption,
        include_subtitles: bool,
        progress: Option<ProgressFn<'_>>,
        cancel: &CancellationToken,
    ) -> Result<(), DownloadError> {
        let caption_tracks = if include_subtitles && !option.container().is_audio_only() {
            self.extractor.caption_manifest(&video.id).await?.tracks
        } else {
            Vec::new()
        };

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        self.extractor
            .download(
                &video.id,
                option.streams(),
                &caption_tracks,
                file_path,
                progress,
                cancel,
            )
            .await?;

        Ok(())
    }
}
