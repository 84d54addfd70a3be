//! `ytdm options` lists the downloadable options for one video.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use ytdm_core::config::YtdmConfig;
use ytdm_core::downloading::VideoDownloader;
use ytdm_core::resolving::QueryResolver;
use ytdm_core::youtube::ytdlp::YtDlpExtractor;
use ytdm_core::youtube::MediaExtractor;

pub async fn run_options(cfg: &YtdmConfig, query: &str) -> Result<()> {
    let extractor: Arc<dyn MediaExtractor> = Arc::new(YtDlpExtractor::new(
        cfg.yt_dlp_path.clone(),
        cfg.cookies_file.clone(),
    )?);

    let resolver = QueryResolver::new(
        Arc::clone(&extractor),
        Duration::from_millis(cfg.lookup_interval_ms),
    );
    let cancel = CancellationToken::new();
    let result = resolver
        .resolve(query, &cancel)
        .await
        .context("could not resolve query")?;
    let Some(video) = result.videos.first() else {
        bail!("query resolved to no videos");
    };

    println!("{} ({})", video.title, video.id);
    if result.videos.len() > 1 {
        tracing::debug!(
            count = result.videos.len(),
            "query resolved to several videos, showing options for the first"
        );
    }

    let downloader = VideoDownloader::new(extractor);
    let options = downloader
        .options(&video.id, cfg.include_language_specific_audio)
        .await?;

    println!("{:<10} {:<12} {:<10} {}", "CONTAINER", "QUALITY", "BITRATE", "STREAMS");
    for option in options {
        let quality = option
            .video_quality()
            .map(|q| q.label())
            .unwrap_or_else(|| "audio".to_string());
        let bitrate = option
            .audio_bitrate()
            .map(|b| format!("{}kbps", b / 1000))
            .unwrap_or_else(|| "-".to_string());
        let streams = option
            .streams()
            .iter()
            .map(|s| s.format_id().to_string())
            .collect::<Vec<_>>()
            .join("+");
        println!(
            "{:<10} {:<12} {:<10} {}",
            option.container().to_string(),
            quality,
            bitrate,
            streams
        );
    }
    Ok(())
}
