//! Netscape cookie file parsing.
//!
//! Cookies are opaque to the engine: they are validated here only enough to
//! count and log them, then handed through to the extraction collaborator
//! unmodified (yt-dlp consumes the file directly).

use std::path::Path;

/// One cookie from a Netscape-format cookie file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    /// Unix timestamp; 0 means a session cookie.
    pub expires: i64,
}

/// Parses Netscape cookie file content. Comment lines are skipped, except the
/// cURL/wget `#HttpOnly_` prefix which marks a valid HttpOnly cookie.
/// Malformed lines (fewer than 7 tab-separated columns) are ignored.
pub fn parse(content: &str) -> Vec<Cookie> {
    let mut cookies = Vec::new();

    for raw_line in content.lines() {
        let mut line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let mut http_only = false;
        if let Some(rest) = strip_prefix_ignore_case(line, "#HttpOnly_") {
            http_only = true;
            line = rest.trim_start();
        } else if line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 7 {
            continue;
        }

        let Ok(expires) = parts[4].parse::<i64>() else {
            continue;
        };

        cookies.push(Cookie {
            domain: parts[0].to_string(),
            path: parts[2].to_string(),
            secure: parts[3].eq_ignore_ascii_case("TRUE"),
            expires,
            name: parts[5].to_string(),
            value: parts[6].to_string(),
            http_only,
        });
    }

    cookies
}

/// Parses a cookie file from disk.
pub fn parse_file(path: &Path) -> std::io::Result<Vec<Cookie>> {
    Ok(parse(&std::fs::read_to_string(path)?))
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Netscape HTTP Cookie File
# This is a comment.

.youtube.com\tTRUE\t/\tTRUE\t1893456000\tPREF\tf1=50000000
#HttpOnly_.youtube.com\tTRUE\t/\tTRUE\t1893456000\tSID\tabc123
broken line without tabs
.youtube.com\tTRUE\t/\tFALSE\t0\tSESSION\txyz
";

    #[test]
    fn parses_valid_rows() {
        let cookies = parse(SAMPLE);
        assert_eq!(cookies.len(), 3);

        assert_eq!(cookies[0].name, "PREF");
        assert_eq!(cookies[0].value, "f1=50000000");
        assert_eq!(cookies[0].domain, ".youtube.com");
        assert!(cookies[0].secure);
        assert!(!cookies[0].http_only);
    }

    #[test]
    fn http_only_prefix_is_a_cookie_not_a_comment() {
        let cookies = parse(SAMPLE);
        let sid = cookies.iter().find(|c| c.name == "SID").unwrap();
        assert!(sid.http_only);
    }

    #[test]
    fn session_cookie_has_zero_expiry() {
        let cookies = parse(SAMPLE);
        let session = cookies.iter().find(|c| c.name == "SESSION").unwrap();
        assert_eq!(session.expires, 0);
        assert!(!session.secure);
    }

    #[test]
    fn empty_content_yields_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("# only comments\n").is_empty());
    }
}
