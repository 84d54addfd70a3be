//! The download pipeline: bounded-concurrency driver for enqueued items.
//!
//! Each item runs as its own task: it waits on the concurrency gate (the only
//! blocking point before work begins), resolves its option if only a
//! preference was supplied, streams through the extraction collaborator, and
//! settles into a terminal state. Errors local to one item never affect its
//! siblings; the gate permit is released on every path.

mod item;

use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::config::YtdmConfig;
use crate::downloading::{DownloadError, DownloadOption, DownloadPreference, VideoDownloader};
use crate::progress::{ProgressAggregator, ProgressInput};
use crate::sync::ResizableSemaphore;
use crate::tagging::TagInjector;
use crate::youtube::Video;

pub use item::{DownloadItem, DownloadRequest, DownloadStatus};

/// Immutable behavior snapshot taken from the config at construction.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub include_subtitles: bool,
    pub include_language_specific_audio: bool,
    pub allow_container_fallback: bool,
}

impl From<&YtdmConfig> for PipelineSettings {
    fn from(cfg: &YtdmConfig) -> Self {
        Self {
            include_subtitles: cfg.include_subtitles,
            include_language_specific_audio: cfg.include_language_specific_audio,
            allow_container_fallback: !cfg.strict_container,
        }
    }
}

pub struct DownloadPipeline {
    downloader: Arc<VideoDownloader>,
    tagger: Option<Arc<dyn TagInjector>>,
    gate: Arc<ResizableSemaphore>,
    aggregator: ProgressAggregator,
    settings: PipelineSettings,
    items: Mutex<Vec<Arc<DownloadItem>>>,
    next_id: AtomicU64,
    active: AtomicUsize,
    idle_notify: Notify,
}

impl DownloadPipeline {
    pub fn new(
        downloader: Arc<VideoDownloader>,
        tagger: Option<Arc<dyn TagInjector>>,
        parallel_limit: usize,
        settings: PipelineSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            downloader,
            tagger,
            gate: ResizableSemaphore::new(parallel_limit),
            aggregator: ProgressAggregator::new(),
            settings,
            items: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            active: AtomicUsize::new(0),
            idle_notify: Notify::new(),
        })
    }

    /// Aggregate progress over the discovery phase and all items.
    pub fn progress(&self) -> &ProgressAggregator {
        &self.aggregator
    }

    /// Snapshot of all items, enqueue order.
    pub fn items(&self) -> Vec<Arc<DownloadItem>> {
        self.items.lock().unwrap().clone()
    }

    /// Applies a new parallelism limit. Queued waiters are granted
    /// immediately if the limit grew; running downloads are never interrupted
    /// if it shrank.
    pub fn set_parallel_limit(&self, limit: usize) {
        self.gate.set_capacity(limit);
    }

    pub fn parallel_limit(&self) -> usize {
        self.gate.max_count()
    }

    pub fn enqueue_with_option(
        self: &Arc<Self>,
        video: Video,
        option: DownloadOption,
        file_path: impl Into<std::path::PathBuf>,
    ) -> Arc<DownloadItem> {
        self.enqueue(video, DownloadRequest::Option(option), file_path.into())
    }

    pub fn enqueue_with_preference(
        self: &Arc<Self>,
        video: Video,
        preference: DownloadPreference,
        file_path: impl Into<std::path::PathBuf>,
    ) -> Arc<DownloadItem> {
        self.enqueue(
            video,
            DownloadRequest::Preference(preference),
            file_path.into(),
        )
    }

    fn enqueue(
        self: &Arc<Self>,
        video: Video,
        request: DownloadRequest,
        file_path: std::path::PathBuf,
    ) -> Arc<DownloadItem> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let item = DownloadItem::new(id, video, request, file_path);
        self.items.lock().unwrap().push(Arc::clone(&item));
        self.spawn_run(Arc::clone(&item));
        item
    }

    /// Requests cancellation of one item; siblings are unaffected.
    pub fn cancel(&self, item: &DownloadItem) {
        item.cancel();
    }

    /// Re-enqueues a terminal item: a fresh item with the same destination
    /// path and the same option/preference replaces it at the same list
    /// position. The old item is disposed first. Returns `None` when the item
    /// is not terminal.
    pub fn restart(self: &Arc<Self>, old: &Arc<DownloadItem>) -> Option<Arc<DownloadItem>> {
        if !old.status().is_terminal() {
            return None;
        }
        old.dispose();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let item = DownloadItem::new(
            id,
            old.video().clone(),
            old.request().clone(),
            old.file_path().to_path_buf(),
        );

        {
            let mut items = self.items.lock().unwrap();
            match items.iter().position(|i| Arc::ptr_eq(i, old)) {
                Some(pos) => items[pos] = Arc::clone(&item),
                None => items.push(Arc::clone(&item)),
            }
        }

        self.spawn_run(Arc::clone(&item));
        Some(item)
    }

    /// Drops an item from the pipeline, canceling it if still in flight.
    pub fn remove(&self, item: &Arc<DownloadItem>) {
        item.cancel();
        item.dispose();
        self.items.lock().unwrap().retain(|i| !Arc::ptr_eq(i, item));
    }

    /// Rejects all queued gate waiters and future enqueued work. Running
    /// transfers finish (or cancel) on their own.
    pub fn dispose(&self) {
        self.gate.dispose();
    }

    /// Waits until no item task is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle_notify.notified();
            if self.active.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    fn spawn_run(self: &Arc<Self>, item: Arc<DownloadItem>) {
        self.active.fetch_add(1, Ordering::AcqRel);
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.run_item(&item).await;
            if pipeline.active.fetch_sub(1, Ordering::AcqRel) == 1 {
                pipeline.idle_notify.notify_waiters();
            }
        });
    }

    async fn run_item(&self, item: &Arc<DownloadItem>) {
        let input = self.aggregator.input(1.0);
        let result = self.drive(item, &input).await;

        match result {
            Ok(()) => {
                input.report(1.0);
                item.finish(DownloadStatus::Completed, None);
                tracing::info!(
                    video = %item.video().id,
                    path = %item.file_path().display(),
                    "download completed"
                );
            }
            Err(DownloadError::Canceled) => {
                remove_partial_file(item.file_path()).await;
                item.finish(DownloadStatus::Canceled, None);
                tracing::info!(video = %item.video().id, "download canceled");
            }
            Err(err) => {
                remove_partial_file(item.file_path()).await;
                tracing::warn!(video = %item.video().id, error = %err, "download failed");
                item.finish(DownloadStatus::Failed, Some(err.user_message()));
            }
        }

        input.complete();
    }

    async fn drive(
        &self,
        item: &Arc<DownloadItem>,
        input: &ProgressInput,
    ) -> Result<(), DownloadError> {
        // The gate is the sole blocking point before work begins. The permit
        // is released when `_permit` drops, on success and failure alike.
        let _permit = self
            .gate
            .acquire(item.token())
            .await
            .map_err(|_| DownloadError::Canceled)?;

        if item.token().is_cancelled() {
            return Err(DownloadError::Canceled);
        }
        item.set_started();

        let option = match item.request() {
            DownloadRequest::Option(option) => option.clone(),
            DownloadRequest::Preference(preference) => {
                self.downloader
                    .best_option(
                        &item.video().id,
                        preference,
                        self.settings.include_language_specific_audio,
                        self.settings.allow_container_fallback,
                    )
                    .await?
            }
        };

        let sink = |fraction: f64| {
            item.set_progress(fraction);
            input.report(fraction);
        };
        self.downloader
            .download(
                item.file_path(),
                item.video(),
                &option,
                self.settings.include_subtitles,
                Some(&sink),
                item.token(),
            )
            .await?;

        if let Some(tagger) = &self.tagger {
            if let Err(err) = tagger
                .inject_tags(item.file_path(), item.video(), item.token())
                .await
            {
                tracing::debug!(
                    video = %item.video().id,
                    error = %err,
                    "tag injection failed, keeping untagged file"
                );
            }
        }

        Ok(())
    }
}

/// Deletes a partially written destination file, best effort.
async fn remove_partial_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial file"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::debug!(path = %path.display(), error = %err, "partial file cleanup failed"),
    }
}
