use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::downloading::QualityPreference;
use crate::youtube::Container;

fn default_parallel_limit() -> usize {
    2
}

fn default_container() -> Container {
    Container::Mp4
}

fn default_file_name_template() -> String {
    "$title".to_string()
}

fn default_lookup_interval_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

/// Global configuration loaded from `~/.config/ytdm/config.toml`.
///
/// This is an immutable snapshot: the pipeline takes it at construction, and
/// later parallelism changes go through `ResizableSemaphore::set_capacity`
/// explicitly rather than through ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YtdmConfig {
    /// How many downloads may run at the same time.
    #[serde(default = "default_parallel_limit")]
    pub parallel_limit: usize,
    /// Default target container ("mp4", "webm", "mp3", "ogg").
    #[serde(default = "default_container")]
    pub container: Container,
    /// Default quality direction ("highest" or "lowest").
    #[serde(default)]
    pub quality: QualityPreference,
    /// Also offer one option per non-default audio language (dubs).
    #[serde(default)]
    pub include_language_specific_audio: bool,
    /// Embed closed captions into video containers.
    #[serde(default = "default_true")]
    pub include_subtitles: bool,
    /// Fail instead of falling back to another container when the requested
    /// one has no streams.
    #[serde(default)]
    pub strict_container: bool,
    /// File name template; tokens: $title, $author, $id, $num.
    #[serde(default = "default_file_name_template")]
    pub file_name_template: String,
    /// Minimum spacing between successive metadata lookups.
    #[serde(default = "default_lookup_interval_ms")]
    pub lookup_interval_ms: u64,
    /// Netscape cookie file passed through to the extractor (authentication).
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,
    /// Explicit yt-dlp binary path; auto-detected when missing.
    #[serde(default)]
    pub yt_dlp_path: Option<PathBuf>,
}

impl Default for YtdmConfig {
    fn default() -> Self {
        Self {
            parallel_limit: default_parallel_limit(),
            container: default_container(),
            quality: QualityPreference::default(),
            include_language_specific_audio: false,
            include_subtitles: true,
            strict_container: false,
            file_name_template: default_file_name_template(),
            lookup_interval_ms: default_lookup_interval_ms(),
            cookies_file: None,
            yt_dlp_path: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ytdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<YtdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = YtdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: YtdmConfig = toml::from_str(&data)?;
    Ok(cfg)
}
