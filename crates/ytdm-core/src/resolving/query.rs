//! Classification of one free-form query line.

use crate::youtube::{ChannelId, PlaylistId, VideoId};

/// What a raw query string refers to.
///
/// A URL that identifies a single video takes precedence over the playlist
/// it may also reference (`watch?v=...&list=...` resolves the video); pure
/// playlist and channel URLs resolve as such. Anything unrecognized, or an
/// explicit `?`-prefixed string, becomes a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Video(VideoId),
    Playlist(PlaylistId),
    Channel(ChannelId),
    Search(String),
}

impl Query {
    pub fn parse(input: &str) -> Query {
        let input = input.trim();

        if let Some(term) = input.strip_prefix('?') {
            return Query::Search(term.trim().to_string());
        }
        if let Some(id) = VideoId::try_parse(input) {
            return Query::Video(id);
        }
        if let Some(id) = PlaylistId::try_parse(input) {
            return Query::Playlist(id);
        }
        if let Some(id) = ChannelId::try_parse(input) {
            return Query::Channel(id);
        }
        Query::Search(input.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_video_urls_and_ids() {
        assert!(matches!(Query::parse("dQw4w9WgXcQ"), Query::Video(_)));
        assert!(matches!(
            Query::parse("https://youtu.be/dQw4w9WgXcQ"),
            Query::Video(_)
        ));
    }

    #[test]
    fn video_takes_precedence_over_list_param() {
        let q = Query::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLabcdef12345");
        assert!(matches!(q, Query::Video(_)));
    }

    #[test]
    fn classifies_playlists_and_channels() {
        assert!(matches!(
            Query::parse("https://www.youtube.com/playlist?list=PLabcdef12345"),
            Query::Playlist(_)
        ));
        assert!(matches!(
            Query::parse("@somehandle"),
            Query::Channel(ChannelId::Handle(_))
        ));
    }

    #[test]
    fn falls_back_to_search() {
        assert_eq!(
            Query::parse("never gonna give you up"),
            Query::Search("never gonna give you up".to_string())
        );
        // Explicit search even if it would otherwise parse as an ID.
        assert_eq!(
            Query::parse("?dQw4w9WgXcQ"),
            Query::Search("dQw4w9WgXcQ".to_string())
        );
    }
}
