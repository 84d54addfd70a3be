//! Error taxonomy for a single download.

use thiserror::Error;

use crate::youtube::ExtractorError;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The manifest contained no usable streams for any container.
    #[error("no downloadable streams available")]
    NoStreamsAvailable,

    /// No option matched the preference (only possible with an empty option set).
    #[error("no suitable download option found")]
    NoSuitableOption,

    /// The item's cancellation token fired. Terminal `Canceled` state; no
    /// error message is recorded for it.
    #[error("download canceled")]
    Canceled,

    #[error(transparent)]
    Extractor(ExtractorError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ExtractorError> for DownloadError {
    fn from(err: ExtractorError) -> Self {
        match err {
            ExtractorError::Canceled => DownloadError::Canceled,
            other => DownloadError::Extractor(other),
        }
    }
}

impl DownloadError {
    /// Short message for known failures, full diagnostic dump for unexpected ones.
    pub fn user_message(&self) -> String {
        match self {
            DownloadError::NoStreamsAvailable
            | DownloadError::NoSuitableOption
            | DownloadError::Canceled => self.to_string(),
            DownloadError::Extractor(
                err @ (ExtractorError::VideoUnavailable(_)
                | ExtractorError::PlaylistUnavailable(_)
                | ExtractorError::ChannelUnavailable(_)
                | ExtractorError::NotFound(_)),
            ) => err.to_string(),
            DownloadError::Extractor(err) => format!("{err:?}"),
            DownloadError::Io(err) => format!("{err:?}"),
        }
    }
}
