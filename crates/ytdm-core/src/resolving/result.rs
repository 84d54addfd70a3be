//! Query results and their aggregation.

use std::collections::HashSet;

use thiserror::Error;

use crate::youtube::Video;

/// The kind of resolution that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryResultKind {
    Video,
    Playlist,
    Channel,
    Search,
    Aggregate,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot aggregate an empty result set")]
pub struct AggregateError;

/// Outcome of resolving one query (or an aggregate of several).
///
/// Invariant: `videos` holds no duplicate IDs; first occurrence wins.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub kind: QueryResultKind,
    pub title: String,
    pub videos: Vec<Video>,
}

impl QueryResult {
    pub fn new(kind: QueryResultKind, title: impl Into<String>, videos: Vec<Video>) -> Self {
        Self {
            kind,
            title: title.into(),
            videos: dedup_by_id(videos),
        }
    }

    /// Combines results into one. A single input is returned unchanged
    /// (kind and title identity); multiple inputs produce an aggregate
    /// titled `{n} queries` with the union of videos, deduplicated by ID
    /// in first-seen order.
    pub fn aggregate(results: Vec<QueryResult>) -> Result<QueryResult, AggregateError> {
        match results.len() {
            0 => Err(AggregateError),
            1 => Ok(results.into_iter().next().unwrap()),
            n => {
                let videos = results.into_iter().flat_map(|r| r.videos).collect();
                Ok(QueryResult {
                    kind: QueryResultKind::Aggregate,
                    title: format!("{n} queries"),
                    videos: dedup_by_id(videos),
                })
            }
        }
    }
}

fn dedup_by_id(videos: Vec<Video>) -> Vec<Video> {
    let mut seen = HashSet::new();
    videos
        .into_iter()
        .filter(|v| seen.insert(v.id.clone()))
        .collect()
}
