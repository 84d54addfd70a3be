//! Destination file naming: escaping, templates, and collision handling.

use std::path::{Path, PathBuf};

use crate::youtube::Video;

/// Characters that are unsafe in file names on at least one supported platform.
const INVALID: &[char] = &['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

/// Replaces invalid file name characters with `_` and strips control characters.
pub fn escape_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_control() || INVALID.contains(&c) {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out.trim_matches(|c: char| c == ' ' || c == '.').to_string()
}

/// Expands a file name template for one video. Supported tokens:
/// `$title`, `$author`, `$id`, `$num` (1-based position in the batch).
/// The result is escaped and carries no extension.
pub fn apply_file_name_template(template: &str, video: &Video, number: usize) -> String {
    let expanded = template
        .replace("$title", &video.title)
        .replace("$author", &video.author)
        .replace("$id", video.id.as_str())
        .replace("$num", &number.to_string());
    escape_file_name(&expanded)
}

/// Returns `path` unchanged if free, otherwise the first `name (k).ext`
/// variant that doesn't exist yet.
pub fn ensure_unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|s| s.to_str());
    let dir = path.parent().unwrap_or_else(|| Path::new(""));

    for k in 1u32.. {
        let name = match ext {
            Some(ext) => format!("{stem} ({k}).{ext}"),
            None => format!("{stem} ({k})"),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::VideoId;

    fn video() -> Video {
        Video {
            id: VideoId::try_parse("dQw4w9WgXcQ").unwrap(),
            title: "Never / Gonna: Give?".to_string(),
            author: "Rick".to_string(),
            duration: None,
            thumbnails: Vec::new(),
        }
    }

    #[test]
    fn escapes_invalid_characters() {
        assert_eq!(escape_file_name("a/b\\c:d"), "a_b_c_d");
        assert_eq!(escape_file_name("  spaced.  "), "spaced");
    }

    #[test]
    fn template_expands_tokens() {
        let name = apply_file_name_template("$num. $author - $title [$id]", &video(), 3);
        assert_eq!(name, "3. Rick - Never _ Gonna_ Give_ [dQw4w9WgXcQ]");
    }

    #[test]
    fn unique_path_appends_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.mp4");
        assert_eq!(ensure_unique_path(&path), path);

        std::fs::write(&path, b"x").unwrap();
        assert_eq!(ensure_unique_path(&path), dir.path().join("video (1).mp4"));

        std::fs::write(dir.path().join("video (1).mp4"), b"x").unwrap();
        assert_eq!(ensure_unique_path(&path), dir.path().join("video (2).mp4"));
    }
}
