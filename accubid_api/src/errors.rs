//! Error types for the API client.

use crate::response::ErrorDetails;

/// Errors that can occur when making API requests.
///
/// A non-2xx HTTP response is not an error at this layer: it comes back as a
/// failed [`ApiResponse`](crate::ApiResponse). Only transport failures that
/// survive every retry, cancellation, and auth failures surface here, plus
/// [`Error::Api`] when a caller explicitly unwraps a failed envelope.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request could not be completed (connection refused, timeout, DNS, body read).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// A failed or empty envelope was unwrapped.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        details: Option<ErrorDetails>,
    },
    /// No valid bearer token could be obtained.
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// The caller's cancellation token fired.
    #[error("Request cancelled")]
    Cancelled,
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// A request body could not be encoded as JSON.
    #[error("Failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
