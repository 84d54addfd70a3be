//! Flattening a stream manifest into downloadable options.

use crate::youtube::{Container, StreamInfo, StreamManifest, VideoQuality};

use super::error::DownloadError;

/// One downloadable combination: a target container plus the source stream(s)
/// that feed it (one muxed stream, or video-only + audio-only, or a single
/// audio-only stream for audio containers).
///
/// Invariant: an audio-only container never carries a video-bearing stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOption {
    container: Container,
    streams: Vec<StreamInfo>,
}

impl DownloadOption {
    fn new(container: Container, streams: Vec<StreamInfo>) -> Self {
        debug_assert!(
            !container.is_audio_only() || streams.iter().all(|s| s.video_quality().is_none()),
            "audio-only container must not carry video streams"
        );
        Self { container, streams }
    }

    pub fn container(&self) -> Container {
        self.container
    }

    pub fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    /// Video quality of this option, if it carries video.
    pub fn video_quality(&self) -> Option<VideoQuality> {
        self.streams.iter().find_map(|s| s.video_quality())
    }

    /// Best audio bitrate among the option's audio sources.
    pub fn audio_bitrate(&self) -> Option<u64> {
        self.streams
            .iter()
            .filter(|s| s.video_quality().is_none() || matches!(s, StreamInfo::Muxed { .. }))
            .map(|s| s.bitrate())
            .max()
    }

    /// Language of the audio track, when this option pins a specific dub.
    pub fn audio_language(&self) -> Option<&str> {
        self.streams
            .iter()
            .filter_map(|s| s.audio_track())
            .find_map(|t| t.language.as_deref())
    }

    /// Short human-readable label: `720p60` / `audio 128kbps` etc.
    pub fn label(&self) -> String {
        let base = match self.video_quality() {
            Some(q) => q.label(),
            None => match self.audio_bitrate() {
                Some(bitrate) => format!("audio {}kbps", bitrate / 1000),
                None => "audio".to_string(),
            },
        };
        match self.audio_language() {
            Some(lang) => format!("{base} [{lang}]"),
            None => base,
        }
    }
}

/// Builds one option per sensible (container, quality) combination reachable
/// from the manifest.
///
/// Muxed streams map 1:1. For containers requiring separate tracks, each
/// video-only stream is paired with the single best-bitrate primary-language
/// audio stream; with `include_language_specific_audio`, one extra option per
/// non-default language is added so a specific dub can be forced. Audio-only
/// containers map audio-only streams directly. Options are not deduplicated
/// across equivalent quality; final selection is the preference matcher's job.
pub fn resolve_options(
    manifest: &StreamManifest,
    include_language_specific_audio: bool,
) -> Result<Vec<DownloadOption>, DownloadError> {
    let mut options = Vec::new();

    for container in [Container::Mp4, Container::WebM] {
        for muxed in manifest.muxed().filter(|s| s.container() == container) {
            options.push(DownloadOption::new(container, vec![muxed.clone()]));
        }

        let primary_audio = best_primary_audio(manifest, container);
        for video in manifest.video_only().filter(|s| s.container() == container) {
            if let Some(audio) = primary_audio {
                options.push(DownloadOption::new(
                    container,
                    vec![video.clone(), audio.clone()],
                ));
            }

            if include_language_specific_audio {
                for audio in non_default_language_audio(manifest, container) {
                    options.push(DownloadOption::new(
                        container,
                        vec![video.clone(), audio.clone()],
                    ));
                }
            }
        }
    }

    for container in [Container::Mp3, Container::Ogg] {
        for audio in manifest.audio_only() {
            let default_track = audio.audio_track().map(|t| t.is_default).unwrap_or(true);
            if default_track || include_language_specific_audio {
                options.push(DownloadOption::new(container, vec![audio.clone()]));
            }
        }
    }

    if options.is_empty() {
        return Err(DownloadError::NoStreamsAvailable);
    }
    Ok(options)
}

/// Best-bitrate default-language audio stream, preferring the same container.
fn best_primary_audio(manifest: &StreamManifest, container: Container) -> Option<&StreamInfo> {
    manifest
        .audio_only()
        .filter(|s| s.audio_track().map(|t| t.is_default).unwrap_or(true))
        .max_by_key(|s| (s.container() == container, s.bitrate()))
}

/// Best stream per distinct non-default audio language.
fn non_default_language_audio(
    manifest: &StreamManifest,
    container: Container,
) -> Vec<&StreamInfo> {
    let mut best: Vec<&StreamInfo> = Vec::new();
    for stream in manifest.audio_only() {
        let Some(track) = stream.audio_track() else {
            continue;
        };
        if track.is_default || track.language.is_none() {
            continue;
        }
        match best
            .iter_mut()
            .find(|s| s.audio_track().map(|t| &t.language) == Some(&track.language))
        {
            Some(existing) => {
                let better = (stream.container() == container, stream.bitrate())
                    > (existing.container() == container, existing.bitrate());
                if better {
                    *existing = stream;
                }
            }
            None => best.push(stream),
        }
    }
    best
}
