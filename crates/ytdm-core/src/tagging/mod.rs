//! Best-effort metadata tag injection after a successful download.
//!
//! Tagging failures never change a download's terminal state: the pipeline
//! logs them and moves on.

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::youtube::Video;

/// Tagging collaborator. Implementations write title/artist metadata into the
/// finished file; they must honor the cancellation token.
#[async_trait]
pub trait TagInjector: Send + Sync {
    async fn inject_tags(
        &self,
        file_path: &Path,
        video: &Video,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()>;
}

/// No-op tagger for setups without a tagging backend.
pub struct NullTagger;

#[async_trait]
impl TagInjector for NullTagger {
    async fn inject_tags(
        &self,
        _file_path: &Path,
        _video: &Video,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
