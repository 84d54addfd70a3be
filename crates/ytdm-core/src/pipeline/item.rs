//! One unit of download work and its observable state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::downloading::{DownloadOption, DownloadPreference};
use crate::youtube::Video;

/// Lifecycle of a download item. Completed, Canceled, and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Enqueued,
    Started,
    Completed,
    Canceled,
    Failed,
}

impl DownloadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DownloadStatus::Completed | DownloadStatus::Canceled | DownloadStatus::Failed
        )
    }
}

/// What to download: an already-chosen option, or a preference the pipeline
/// resolves once the item starts.
#[derive(Debug, Clone)]
pub enum DownloadRequest {
    Option(DownloadOption),
    Preference(DownloadPreference),
}

struct ItemState {
    status: DownloadStatus,
    progress: f64,
    error_message: Option<String>,
}

/// The unit of work owned by the pipeline from enqueue to disposal.
///
/// Only the pipeline task driving the item mutates it; everyone else reads
/// snapshots. The item owns an independent cancellation token: canceling it
/// affects this item alone.
pub struct DownloadItem {
    id: u64,
    video: Video,
    file_path: PathBuf,
    request: DownloadRequest,
    state: Mutex<ItemState>,
    cancel: CancellationToken,
    disposed: AtomicBool,
}

impl DownloadItem {
    pub(crate) fn new(
        id: u64,
        video: Video,
        request: DownloadRequest,
        file_path: PathBuf,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            video,
            file_path,
            request,
            state: Mutex::new(ItemState {
                status: DownloadStatus::Enqueued,
                progress: 0.0,
                error_message: None,
            }),
            cancel: CancellationToken::new(),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn video(&self) -> &Video {
        &self.video
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn request(&self) -> &DownloadRequest {
        &self.request
    }

    pub fn status(&self) -> DownloadStatus {
        self.state.lock().unwrap().status
    }

    /// Fractional progress in [0, 1].
    pub fn progress(&self) -> f64 {
        self.state.lock().unwrap().progress
    }

    /// Short failure description; only set in the Failed state.
    pub fn error_message(&self) -> Option<String> {
        self.state.lock().unwrap().error_message.clone()
    }

    /// Requests cancellation. A no-op once the item is terminal or disposed.
    pub fn cancel(&self) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        if !self.status().is_terminal() {
            self.cancel.cancel();
        }
    }

    /// Releases the item's cancellation handle. Idempotent; returns whether
    /// this call performed the disposal.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        // Wake anything still waiting on this item's token.
        self.cancel.cancel();
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn set_started(&self) {
        self.state.lock().unwrap().status = DownloadStatus::Started;
    }

    pub(crate) fn set_progress(&self, fraction: f64) {
        self.state.lock().unwrap().progress = fraction.clamp(0.0, 1.0);
    }

    pub(crate) fn finish(&self, status: DownloadStatus, error_message: Option<String>) {
        debug_assert!(status.is_terminal());
        let mut state = self.state.lock().unwrap();
        state.status = status;
        state.error_message = error_message;
        if status == DownloadStatus::Completed {
            state.progress = 1.0;
        }
    }
}
