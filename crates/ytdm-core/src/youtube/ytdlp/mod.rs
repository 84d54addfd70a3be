//! `MediaExtractor` implementation backed by the `yt-dlp` binary.
//!
//! Metadata comes from `-J` dumps parsed by [`metadata`]; transfers shell out
//! with `--newline` and scrape the percentage off each progress line.
//! Cancellation kills the child process.

mod metadata;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::extractor::{Channel, ExtractorError, MediaExtractor, Playlist, ProgressFn};
use super::ids::{ChannelId, PlaylistId, VideoId};
use super::streams::{CaptionManifest, CaptionTrack, Container, StreamInfo, StreamManifest};
use super::video::Video;
use metadata::{PlaylistJson, VideoJson};

const TOOL: &str = "yt-dlp";

/// Fallback locations checked when the binary is not on `PATH`.
const KNOWN_LOCATIONS: &[&str] = &[
    "/usr/local/bin/yt-dlp",
    "/usr/bin/yt-dlp",
    "/opt/homebrew/bin/yt-dlp",
];

pub struct YtDlpExtractor {
    binary: PathBuf,
    cookies_file: Option<PathBuf>,
}

impl YtDlpExtractor {
    /// Uses the given binary path when set, otherwise searches `PATH` and the
    /// usual install locations.
    pub fn new(
        binary: Option<PathBuf>,
        cookies_file: Option<PathBuf>,
    ) -> Result<Self, ExtractorError> {
        let binary = match binary {
            Some(path) if path.is_file() => path,
            Some(path) => {
                return Err(ExtractorError::Tool {
                    tool: TOOL.to_string(),
                    message: format!("no binary at {}", path.display()),
                })
            }
            None => locate_binary().ok_or_else(|| ExtractorError::Tool {
                tool: TOOL.to_string(),
                message: "binary not found; install yt-dlp or set yt_dlp_path in the config"
                    .to_string(),
            })?,
        };
        tracing::debug!(binary = %binary.display(), "using yt-dlp");
        Ok(Self {
            binary,
            cookies_file,
        })
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--no-warnings").arg("--ignore-config");
        if let Some(cookies) = &self.cookies_file {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }

    async fn dump_json<T: DeserializeOwned>(
        &self,
        url: &str,
        extra: &[&str],
    ) -> Result<T, ExtractorError> {
        tracing::debug!(%url, "yt-dlp metadata dump");
        let output = self
            .command()
            .args(extra)
            .arg("-J")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(tool_error(&output.stderr));
        }
        serde_json::from_slice(&output.stdout).map_err(|err| ExtractorError::Tool {
            tool: TOOL.to_string(),
            message: format!("unparseable metadata dump: {err}"),
        })
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn video(&self, id: &VideoId) -> Result<Video, ExtractorError> {
        let dump: VideoJson = self
            .dump_json(&id.url(), &["--no-playlist"])
            .await
            .map_err(|err| mark_video_unavailable(err, id))?;
        dump.to_video()
            .ok_or_else(|| ExtractorError::VideoUnavailable(id.clone()))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Video>, ExtractorError> {
        let url = format!("ytsearch{limit}:{query}");
        let dump: PlaylistJson = self.dump_json(&url, &["--flat-playlist"]).await?;
        Ok(dump
            .entries
            .iter()
            .filter_map(metadata::EntryJson::to_video)
            .collect())
    }

    async fn playlist(&self, id: &PlaylistId) -> Result<Playlist, ExtractorError> {
        let dump: PlaylistJson = self
            .dump_json(&id.url(), &["--flat-playlist"])
            .await
            .map_err(|err| match err {
                ExtractorError::Tool { ref message, .. } if looks_unavailable(message) => {
                    ExtractorError::PlaylistUnavailable(id.clone())
                }
                other => other,
            })?;
        Ok(Playlist {
            id: id.clone(),
            title: dump
                .title
                .clone()
                .unwrap_or_else(|| id.as_str().to_string()),
            videos: dump
                .entries
                .iter()
                .filter_map(metadata::EntryJson::to_video)
                .collect(),
        })
    }

    async fn channel_uploads(&self, id: &ChannelId) -> Result<Channel, ExtractorError> {
        let url = format!("{}/videos", id.url());
        let dump: PlaylistJson = self
            .dump_json(&url, &["--flat-playlist"])
            .await
            .map_err(|err| match err {
                ExtractorError::Tool { ref message, .. } if looks_unavailable(message) => {
                    ExtractorError::ChannelUnavailable(id.clone())
                }
                other => other,
            })?;
        // yt-dlp titles the videos tab "<channel> - Videos".
        let title = dump
            .title
            .as_deref()
            .map(|t| t.strip_suffix(" - Videos").unwrap_or(t).to_string())
            .unwrap_or_else(|| id.to_string());
        Ok(Channel {
            id: id.clone(),
            title,
            videos: dump
                .entries
                .iter()
                .filter_map(metadata::EntryJson::to_video)
                .collect(),
        })
    }

    async fn manifest(&self, id: &VideoId) -> Result<StreamManifest, ExtractorError> {
        let dump: VideoJson = self
            .dump_json(&id.url(), &["--no-playlist"])
            .await
            .map_err(|err| mark_video_unavailable(err, id))?;
        Ok(dump.to_manifest())
    }

    async fn caption_manifest(&self, id: &VideoId) -> Result<CaptionManifest, ExtractorError> {
        let dump: VideoJson = self
            .dump_json(&id.url(), &["--no-playlist"])
            .await
            .map_err(|err| mark_video_unavailable(err, id))?;
        Ok(dump.to_caption_manifest())
    }

    async fn download(
        &self,
        video: &VideoId,
        streams: &[StreamInfo],
        captions: &[CaptionTrack],
        dest: &Path,
        progress: Option<ProgressFn<'_>>,
        cancel: &CancellationToken,
    ) -> Result<(), ExtractorError> {
        let selector = streams
            .iter()
            .map(StreamInfo::format_id)
            .collect::<Vec<_>>()
            .join("+");
        let container: Option<Container> = dest
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok());

        let mut cmd = self.command();
        cmd.arg("--no-playlist")
            .arg("--newline")
            .arg("-f")
            .arg(&selector);
        match container {
            Some(c) if c.is_audio_only() => {
                cmd.arg("-x").arg("--audio-format").arg(c.ext());
            }
            Some(c) => {
                cmd.arg("--merge-output-format").arg(c.ext());
            }
            None => {}
        }
        if !captions.is_empty() {
            let langs = captions
                .iter()
                .map(|t| t.language.as_str())
                .collect::<Vec<_>>()
                .join(",");
            cmd.arg("--embed-subs").arg("--sub-langs").arg(langs);
            if captions.iter().any(|t| t.is_auto_generated) {
                cmd.arg("--write-auto-subs");
            }
        }
        cmd.arg("-o").arg(dest).arg(video.url());

        tracing::debug!(video = %video, format = %selector, dest = %dest.display(), "yt-dlp download");
        let mut child = cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| ExtractorError::Tool {
            tool: TOOL.to_string(),
            message: "stdout pipe missing".to_string(),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| ExtractorError::Tool {
            tool: TOOL.to_string(),
            message: "stderr pipe missing".to_string(),
        })?;
        // Drain stderr concurrently so the child never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    stderr_task.abort();
                    return Err(ExtractorError::Canceled);
                }
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if let (Some(fraction), Some(report)) = (parse_progress(&line), progress) {
                            report(fraction);
                        }
                    }
                    None => break,
                }
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            if cancel.is_cancelled() {
                return Err(ExtractorError::Canceled);
            }
            let stderr_buf = stderr_task.await.unwrap_or_default();
            return Err(mark_video_unavailable(tool_error(&stderr_buf), video));
        }
        Ok(())
    }
}

fn locate_binary() -> Option<PathBuf> {
    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join("yt-dlp");
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    KNOWN_LOCATIONS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Extracts the last non-empty stderr line as the failure message.
fn tool_error(stderr: &[u8]) -> ExtractorError {
    let text = String::from_utf8_lossy(stderr);
    let message = text
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("exited with an error")
        .trim()
        .to_string();
    ExtractorError::Tool {
        tool: TOOL.to_string(),
        message,
    }
}

fn mark_video_unavailable(err: ExtractorError, id: &VideoId) -> ExtractorError {
    match &err {
        ExtractorError::Tool { message, .. } if looks_unavailable(message) => {
            ExtractorError::VideoUnavailable(id.clone())
        }
        _ => err,
    }
}

fn looks_unavailable(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    [
        "unavailable",
        "private video",
        "has been removed",
        "does not exist",
        "not available",
        "account associated with this video has been terminated",
    ]
    .iter()
    .any(|phrase| lower.contains(phrase))
}

fn parse_progress(line: &str) -> Option<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").expect("progress pattern compiles")
    });
    let pct: f64 = re.captures(line)?.get(1)?.as_str().parse().ok()?;
    Some((pct / 100.0).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_progress_lines() {
        assert_eq!(
            parse_progress("[download]  42.3% of 10.00MiB at 1.00MiB/s ETA 00:06"),
            Some(0.423)
        );
        assert_eq!(
            parse_progress("[download] 100% of 10.00MiB in 00:10"),
            Some(1.0)
        );
        assert_eq!(parse_progress("[info] Writing video metadata"), None);
        assert_eq!(parse_progress("[download] Destination: out.mp4"), None);
    }

    #[test]
    fn tool_error_reports_last_stderr_line() {
        let err = tool_error(b"WARNING: something\nERROR: Video unavailable\n\n");
        match err {
            ExtractorError::Tool { message, .. } => {
                assert_eq!(message, "ERROR: Video unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unavailable_messages_are_recognized() {
        assert!(looks_unavailable("ERROR: Video unavailable"));
        assert!(looks_unavailable("ERROR: Private video. Sign in."));
        assert!(looks_unavailable("The playlist does not exist."));
        assert!(!looks_unavailable("ERROR: network timeout"));
    }
}
