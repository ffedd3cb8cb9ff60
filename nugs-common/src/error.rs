use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum NugsError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("URL Error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Malformed metadata for {0}: {1}")]
    MalformedMetadata(String, String),

    #[error("Invalid version '{0}': {1}")]
    VersionParse(String, String),

    #[error("No download location for {0}")]
    ArtifactUnavailable(String),

    #[error("DownloadError: Failed to download '{0}' from '{1}': {2}")]
    DownloadError(String, String, String),

    #[error("Checksum Mismatch: {0}")]
    ChecksumMismatch(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("HttpError: {0}")]
    HttpError(String),

    #[error("IoError: {0}")]
    IoError(String),
}

impl NugsError {
    /// The registry answered but knows no such package/version.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The registry answered with something that could not be structured.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedMetadata(..) | Self::Json(_))
    }
}

impl From<std::io::Error> for NugsError {
    fn from(err: std::io::Error) -> Self {
        NugsError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for NugsError {
    fn from(err: reqwest::Error) -> Self {
        NugsError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for NugsError {
    fn from(err: serde_json::Error) -> Self {
        NugsError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, NugsError>;
