use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by a [`crate::fetcher::PageFetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} while fetching {url}")]
    Status { url: String, status: StatusCode },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Everything that can abort a content group walk or a folder expansion.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unable to extract integration blob ({occurrence}). Are you authenticated?")]
    MissingBlob { occurrence: u8 },

    #[error("Unable to extract integration JSON")]
    MissingJson,

    #[error("Unable to extract page heading")]
    MissingHeading,

    #[error("Integration blob is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Integration blob is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Integration JSON is malformed: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid content id: {0}")]
    InvalidContentId(String),

    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type Result<T, E = ExtractionError> = std::result::Result<T, E>;
