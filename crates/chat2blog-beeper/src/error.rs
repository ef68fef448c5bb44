//! Error types for Beeper API operations.

use std::io;

/// Result type alias for Beeper API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message used when the remote error body carries no `message` field.
pub(crate) const DEFAULT_API_ERROR: &str = "Beeper API error";

/// Beeper API error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No access token is configured; no request was sent.
    #[error("Beeper API token not configured")]
    NotConfigured,

    /// Transport-level failure (DNS, connection refused, timeout).
    #[error("Failed to connect to Beeper: {0}")]
    RemoteUnavailable(#[source] reqwest::Error),

    /// The remote answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message reported by the remote, or a generic fallback.
        message: String,
    },

    /// The remote answered 2xx but the body had an unexpected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The media handle is empty or cannot be resolved.
    #[error("Invalid media handle: {0}")]
    InvalidMediaHandle(String),

    /// I/O error while reading a local media file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Creates an API error from a status code and optional remote message.
    #[must_use]
    pub fn api(status: u16, message: Option<String>) -> Self {
        Self::Api {
            status,
            message: message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_API_ERROR.to_string()),
        }
    }

    /// Returns the HTTP status for [`Error::Api`] errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
