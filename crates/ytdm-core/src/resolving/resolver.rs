//! Resolves free-form queries into video collections via the extractor.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::sync::{ThrottleLock, WaitCanceled};
use crate::youtube::{ChannelId, ExtractorError, MediaExtractor, PlaylistId, VideoId};

use super::query::Query;
use super::result::{QueryResult, QueryResultKind};

/// How many results an open-ended search contributes.
const SEARCH_RESULT_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("video {0} is unavailable")]
    VideoUnavailable(VideoId),

    #[error("playlist {0} is unavailable")]
    PlaylistUnavailable(PlaylistId),

    #[error("channel {0} is unavailable")]
    ChannelUnavailable(ChannelId),

    #[error("no results found for `{0}`")]
    NotFound(String),

    #[error("nothing could be resolved from the given queries")]
    NothingResolved,

    #[error("query resolution canceled")]
    Canceled,

    #[error(transparent)]
    Extractor(ExtractorError),
}

impl ResolveError {
    /// Recoverable lookup failures are skipped (with a notification) in a
    /// multi-query batch instead of aborting it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ResolveError::VideoUnavailable(_)
                | ResolveError::PlaylistUnavailable(_)
                | ResolveError::ChannelUnavailable(_)
                | ResolveError::NotFound(_)
        )
    }
}

impl From<ExtractorError> for ResolveError {
    fn from(err: ExtractorError) -> Self {
        match err {
            ExtractorError::VideoUnavailable(id) => ResolveError::VideoUnavailable(id),
            ExtractorError::PlaylistUnavailable(id) => ResolveError::PlaylistUnavailable(id),
            ExtractorError::ChannelUnavailable(id) => ResolveError::ChannelUnavailable(id),
            ExtractorError::NotFound(query) => ResolveError::NotFound(query),
            ExtractorError::Canceled => ResolveError::Canceled,
            other => ResolveError::Extractor(other),
        }
    }
}

impl From<WaitCanceled> for ResolveError {
    fn from(_: WaitCanceled) -> Self {
        ResolveError::Canceled
    }
}

/// A query that failed recoverably during a batch and was excluded.
#[derive(Debug)]
pub struct SkippedQuery {
    pub query: String,
    pub error: ResolveError,
}

/// Result of resolving a batch of queries.
#[derive(Debug)]
pub struct BatchOutcome {
    pub result: QueryResult,
    pub skipped: Vec<SkippedQuery>,
}

/// Resolves queries against the extractor, spacing remote lookups through a
/// throttle so rapid batches don't hammer the endpoint.
pub struct QueryResolver {
    extractor: Arc<dyn MediaExtractor>,
    throttle: ThrottleLock,
}

impl QueryResolver {
    pub fn new(extractor: Arc<dyn MediaExtractor>, lookup_interval: Duration) -> Self {
        Self {
            extractor,
            throttle: ThrottleLock::new(lookup_interval),
        }
    }

    /// Resolves a single query. All failures propagate to the caller.
    pub async fn resolve(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryResult, ResolveError> {
        self.throttle.wait(cancel).await?;

        match Query::parse(query) {
            Query::Video(id) => {
                let video = self.extractor.video(&id).await?;
                Ok(QueryResult::new(
                    QueryResultKind::Video,
                    video.title.clone(),
                    vec![video],
                ))
            }
            Query::Playlist(id) => {
                let playlist = self.extractor.playlist(&id).await?;
                Ok(QueryResult::new(
                    QueryResultKind::Playlist,
                    playlist.title,
                    playlist.videos,
                ))
            }
            Query::Channel(id) => {
                let channel = self.extractor.channel_uploads(&id).await?;
                Ok(QueryResult::new(
                    QueryResultKind::Channel,
                    format!("Channel uploads: {}", channel.title),
                    channel.videos,
                ))
            }
            Query::Search(term) => {
                let videos = self.extractor.search(&term, SEARCH_RESULT_LIMIT).await?;
                if videos.is_empty() {
                    return Err(ResolveError::NotFound(term));
                }
                Ok(QueryResult::new(
                    QueryResultKind::Search,
                    format!("Search: {term}"),
                    videos,
                ))
            }
        }
    }

    /// Resolves newline-separated queries in input order and aggregates them.
    ///
    /// With a single query, any failure propagates directly. With several,
    /// recoverable lookup failures are skipped and recorded in
    /// [`BatchOutcome::skipped`] while the rest continue. `progress` receives
    /// `(completed / total)` after every query, success or failure.
    pub async fn resolve_batch(
        &self,
        input: &str,
        progress: Option<&(dyn Fn(f64) + Send + Sync)>,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, ResolveError> {
        let queries: Vec<&str> = input
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let total = queries.len();

        let report = |done: usize| {
            if let Some(progress) = progress {
                progress(done as f64 / total.max(1) as f64);
            }
        };

        if total <= 1 {
            let query = queries.first().ok_or(ResolveError::NothingResolved)?;
            let result = self.resolve(query, cancel).await;
            report(1);
            return Ok(BatchOutcome {
                result: result?,
                skipped: Vec::new(),
            });
        }

        let mut results = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        for (index, query) in queries.iter().enumerate() {
            match self.resolve(query, cancel).await {
                Ok(result) => results.push(result),
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(query, error = %err, "skipping unresolvable query");
                    skipped.push(SkippedQuery {
                        query: query.to_string(),
                        error: err,
                    });
                }
                Err(err) => return Err(err),
            }
            report(index + 1);
        }

        let result = QueryResult::aggregate(results).map_err(|_| ResolveError::NothingResolved)?;
        Ok(BatchOutcome { result, skipped })
    }
}
