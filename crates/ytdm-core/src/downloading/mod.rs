//! Download options, preference matching, and the single-video downloader.

mod downloader;
mod error;
mod option;
mod preference;

pub use downloader::VideoDownloader;
pub use error::DownloadError;
pub use option::{resolve_options, DownloadOption};
pub use preference::{DownloadPreference, QualityPreference};
