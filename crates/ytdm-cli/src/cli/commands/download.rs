//! `ytdm download` resolves queries and drives the pipeline to completion.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use ytdm_core::config::YtdmConfig;
use ytdm_core::downloading::{DownloadPreference, QualityPreference, VideoDownloader};
use ytdm_core::pipeline::{DownloadPipeline, DownloadStatus, PipelineSettings};
use ytdm_core::resolving::QueryResolver;
use ytdm_core::tagging::NullTagger;
use ytdm_core::util::cookies;
use ytdm_core::util::paths::{apply_file_name_template, ensure_unique_path};
use ytdm_core::youtube::ytdlp::YtDlpExtractor;
use ytdm_core::youtube::{Container, MediaExtractor};

const PROGRESS_INTERVAL_MS: u64 = 200;

pub async fn run_download(
    cfg: &YtdmConfig,
    queries: &[String],
    output: &Path,
    parallel: Option<usize>,
    container: Option<Container>,
    quality: Option<QualityPreference>,
) -> Result<()> {
    if let Some(cookie_path) = &cfg.cookies_file {
        match cookies::parse_file(cookie_path) {
            Ok(parsed) => {
                tracing::info!(count = parsed.len(), path = %cookie_path.display(), "loaded cookies");
            }
            Err(err) => {
                tracing::warn!(path = %cookie_path.display(), error = %err, "could not read cookie file");
            }
        }
    }

    let extractor: Arc<dyn MediaExtractor> = Arc::new(YtDlpExtractor::new(
        cfg.yt_dlp_path.clone(),
        cfg.cookies_file.clone(),
    )?);

    // Ctrl-C cancels resolution and every in-flight download.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\ninterrupted, canceling...");
                cancel.cancel();
            }
        });
    }

    println!("Resolving {} query(ies)...", queries.len());
    let resolver = QueryResolver::new(
        Arc::clone(&extractor),
        Duration::from_millis(cfg.lookup_interval_ms),
    );
    let outcome = resolver
        .resolve_batch(&queries.join("\n"), None, &cancel)
        .await
        .context("query resolution failed")?;

    for skipped in &outcome.skipped {
        eprintln!("skipped `{}`: {}", skipped.query, skipped.error);
    }
    let result = outcome.result;
    if result.videos.is_empty() {
        bail!("no videos to download");
    }
    println!("{}: {} video(s)", result.title, result.videos.len());

    let preference = DownloadPreference::new(
        container.unwrap_or(cfg.container),
        quality.unwrap_or(cfg.quality),
    );
    let downloader = Arc::new(VideoDownloader::new(Arc::clone(&extractor)));
    let pipeline = DownloadPipeline::new(
        downloader,
        Some(Arc::new(NullTagger)),
        parallel.unwrap_or(cfg.parallel_limit).max(1),
        PipelineSettings::from(cfg),
    );

    for (index, video) in result.videos.iter().enumerate() {
        let name = apply_file_name_template(&cfg.file_name_template, video, index + 1);
        let path = ensure_unique_path(
            &output.join(format!("{name}.{}", preference.container.ext())),
        );
        pipeline.enqueue_with_preference(video.clone(), preference, path);
    }

    // Relay cancellation into the pipeline.
    {
        let pipeline = Arc::clone(&pipeline);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            pipeline.dispose();
            for item in pipeline.items() {
                item.cancel();
            }
        });
    }

    let render = {
        let mut rx = pipeline.progress().watch();
        tokio::spawn(async move {
            let mut last_print = Instant::now();
            while rx.changed().await.is_ok() {
                let fraction = *rx.borrow();
                let now = Instant::now();
                if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                    || fraction >= 1.0
                {
                    print!("\r  overall {:5.1}%  ", fraction * 100.0);
                    let _ = std::io::stdout().flush();
                    last_print = now;
                }
            }
        })
    };

    pipeline.wait_idle().await;
    render.abort();
    println!();

    let items = pipeline.items();
    let completed = items
        .iter()
        .filter(|i| i.status() == DownloadStatus::Completed)
        .count();
    let canceled = items
        .iter()
        .filter(|i| i.status() == DownloadStatus::Canceled)
        .count();
    let failed: Vec<_> = items
        .iter()
        .filter(|i| i.status() == DownloadStatus::Failed)
        .collect();

    for item in &failed {
        eprintln!(
            "failed: {} ({})",
            item.video().title,
            item.error_message().unwrap_or_else(|| "unknown error".to_string())
        );
    }
    println!(
        "{completed} completed, {} failed, {canceled} canceled",
        failed.len()
    );

    if cancel.is_cancelled() {
        bail!("interrupted");
    }
    if !failed.is_empty() {
        bail!("{} download(s) failed", failed.len());
    }
    Ok(())
}
