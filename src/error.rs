//! Crate-wide error type for configuration, credential and ARM failures.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required setting is missing or unparsable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Acquiring an access token for ARM failed.
    #[error("Credential error: {0}")]
    Credential(String),

    /// ARM answered 404 for the requested resource.
    #[error("{message}")]
    NotFound { code: String, message: String },

    /// ARM answered with any other error status, or a long-running
    /// operation finished as Failed/Canceled.
    #[error("{message}")]
    Azure {
        status: u16,
        code: String,
        message: String,
    },

    /// A long-running operation did not finish in time.
    #[error("Operation timed out after {0}s: {1}")]
    Timeout(u64, String),

    #[error("Invalid response from {url}: path={path} error={source}")]
    Decode {
        url: String,
        path: String,
        source: serde_json::Error,
    },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// True for errors ARM reported for the target resource itself
    /// (not transport or decoding failures).
    pub fn is_azure(&self) -> bool {
        matches!(self, Error::Azure { .. } | Error::NotFound { .. })
    }
}
