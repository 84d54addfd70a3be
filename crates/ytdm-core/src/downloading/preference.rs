//! Matching a user preference against the available options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::youtube::Container;

use super::option::DownloadOption;

/// Which end of the quality range the user wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreference {
    #[default]
    Highest,
    Lowest,
}

impl fmt::Display for QualityPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityPreference::Highest => f.write_str("highest"),
            QualityPreference::Lowest => f.write_str("lowest"),
        }
    }
}

impl FromStr for QualityPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "highest" | "best" => Ok(QualityPreference::Highest),
            "lowest" | "worst" => Ok(QualityPreference::Lowest),
            other => Err(format!("unknown quality preference: {other}")),
        }
    }
}

/// Pure value describing what to download when no explicit option was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadPreference {
    pub container: Container,
    pub quality: QualityPreference,
}

/// Ranking key: video options order by (has video, height, framerate),
/// audio-only options by bitrate. Lexicographic.
fn quality_rank(option: &DownloadOption) -> (u8, u64, u64) {
    match option.video_quality() {
        Some(q) => (1, q.height as u64, q.framerate as u64),
        None => (0, option.audio_bitrate().unwrap_or(0), 0),
    }
}

impl DownloadPreference {
    pub fn new(container: Container, quality: QualityPreference) -> Self {
        Self { container, quality }
    }

    /// Picks the single best option for this preference.
    ///
    /// Options matching the requested container exactly are preferred; when
    /// none match and `allow_container_fallback` is set, selection falls back
    /// to the full set rather than failing outright. Ties break toward an
    /// exact container match, then toward the earliest option (stable).
    /// Returns `None` only for an empty candidate set.
    pub fn best_option<'a>(
        &self,
        options: &'a [DownloadOption],
        allow_container_fallback: bool,
    ) -> Option<&'a DownloadOption> {
        let exact: Vec<&DownloadOption> = options
            .iter()
            .filter(|o| o.container() == self.container)
            .collect();

        let pool: Vec<&DownloadOption> = if !exact.is_empty() {
            exact
        } else if allow_container_fallback {
            options.iter().collect()
        } else {
            return None;
        };

        let mut best: Option<&DownloadOption> = None;
        for candidate in pool {
            let Some(current) = best else {
                best = Some(candidate);
                continue;
            };
            let ordering = quality_rank(candidate).cmp(&quality_rank(current));
            let improves = match self.quality {
                QualityPreference::Highest => ordering.is_gt(),
                QualityPreference::Lowest => ordering.is_lt(),
            };
            let wins_tie = ordering.is_eq()
                && candidate.container() == self.container
                && current.container() != self.container;
            if improves || wins_tie {
                best = Some(candidate);
            }
        }
        best
    }
}
