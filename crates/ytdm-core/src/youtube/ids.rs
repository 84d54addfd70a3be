//! Identifiers for videos, playlists, and channels.
//!
//! `try_parse` accepts both raw IDs and the common URL shapes. Parsing is
//! lenient about missing schemes (`youtube.com/watch?v=...` works) and
//! returns `None` for anything that doesn't look like a valid identifier.

use std::fmt;
use url::Url;

/// YouTube video ID (11 URL-safe base64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

/// YouTube playlist ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaylistId(String);

/// Reference to a channel: either a canonical `UC...` ID or an `@handle`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Id(String),
    Handle(String),
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Parses the input as a URL, tolerating a missing scheme for YouTube hosts.
fn parse_url(input: &str) -> Option<Url> {
    if let Ok(url) = Url::parse(input) {
        return Some(url);
    }
    let lowered = input.to_ascii_lowercase();
    if lowered.starts_with("youtube.com/")
        || lowered.starts_with("www.youtube.com/")
        || lowered.starts_with("m.youtube.com/")
        || lowered.starts_with("music.youtube.com/")
        || lowered.starts_with("youtu.be/")
    {
        return Url::parse(&format!("https://{input}")).ok();
    }
    None
}

fn is_youtube_host(url: &Url) -> bool {
    matches!(
        url.host_str().map(|h| h.trim_start_matches("www.")),
        Some("youtube.com") | Some("m.youtube.com") | Some("music.youtube.com")
    )
}

fn query_param<'a>(url: &'a Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

impl VideoId {
    fn is_valid(s: &str) -> bool {
        s.len() == 11 && s.chars().all(is_id_char)
    }

    /// Parses a raw video ID or a video URL (watch, short link, shorts, embed, live).
    pub fn try_parse(input: &str) -> Option<Self> {
        let input = input.trim();

        if Self::is_valid(input) {
            return Some(Self(input.to_string()));
        }

        let url = parse_url(input)?;

        if url.host_str() == Some("youtu.be") {
            let id = url.path_segments()?.next()?.to_string();
            return Self::is_valid(&id).then_some(Self(id));
        }

        if !is_youtube_host(&url) {
            return None;
        }

        if url.path() == "/watch" {
            let id = query_param(&url, "v")?;
            return Self::is_valid(&id).then_some(Self(id));
        }

        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("shorts") | Some("embed") | Some("live") => {
                let id = segments.next()?.to_string();
                Self::is_valid(&id).then_some(Self(id))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video.
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PlaylistId {
    fn is_valid(s: &str) -> bool {
        // System playlists (watch later, liked videos) are short and fixed.
        if s == "WL" || s == "LL" {
            return true;
        }
        s.len() >= 13
            && s.chars().all(is_id_char)
            && ["PL", "RD", "UL", "UU", "PU", "OL", "LL", "FL"]
                .iter()
                .any(|p| s.starts_with(p))
    }

    /// Parses a raw playlist ID or any YouTube URL carrying a `list` parameter.
    pub fn try_parse(input: &str) -> Option<Self> {
        let input = input.trim();

        if Self::is_valid(input) {
            return Some(Self(input.to_string()));
        }

        let url = parse_url(input)?;
        if !is_youtube_host(&url) {
            return None;
        }

        let id = query_param(&url, "list")?;
        Self::is_valid(&id).then_some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical playlist URL.
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/playlist?list={}", self.0)
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ChannelId {
    fn is_valid_id(s: &str) -> bool {
        s.len() == 24 && s.starts_with("UC") && s.chars().all(is_id_char)
    }

    fn is_valid_handle(s: &str) -> bool {
        !s.is_empty()
            && s.len() <= 30
            && s.chars().all(|c| is_id_char(c) || c == '.')
    }

    /// Parses a raw `UC...` ID, an `@handle`, or a channel URL.
    pub fn try_parse(input: &str) -> Option<Self> {
        let input = input.trim();

        if Self::is_valid_id(input) {
            return Some(Self::Id(input.to_string()));
        }
        if let Some(handle) = input.strip_prefix('@') {
            return Self::is_valid_handle(handle).then(|| Self::Handle(handle.to_string()));
        }

        let url = parse_url(input)?;
        if !is_youtube_host(&url) {
            return None;
        }

        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("channel") => {
                let id = segments.next()?.to_string();
                Self::is_valid_id(&id).then_some(Self::Id(id))
            }
            Some(seg) => {
                let handle = seg.strip_prefix('@')?;
                Self::is_valid_handle(handle).then(|| Self::Handle(handle.to_string()))
            }
            None => None,
        }
    }

    /// Canonical channel URL.
    pub fn url(&self) -> String {
        match self {
            ChannelId::Id(id) => format!("https://www.youtube.com/channel/{id}"),
            ChannelId::Handle(handle) => format!("https://www.youtube.com/@{handle}"),
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Id(id) => f.write_str(id),
            ChannelId::Handle(handle) => write!(f, "@{handle}"),
        }
    }
}
