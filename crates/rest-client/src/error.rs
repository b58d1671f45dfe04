//! Transport error types.

use thiserror::Error;

/// Errors that can occur before an HTTP status is received.
#[derive(Debug, Error)]
pub enum RestError {
    /// Request timed out.
    #[error("Request timeout")]
    Timeout,

    /// Connection error (network issue).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failed to read the response body.
    #[error("Body read error: {0}")]
    Body(String),

    /// Failed to build the HTTP client or request.
    #[error("Request build error: {0}")]
    RequestBuild(String),
}

impl RestError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RestError::Timeout | RestError::Connection(_) | RestError::Body(_)
        )
    }
}

impl From<reqwest::Error> for RestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RestError::Timeout
        } else if err.is_builder() {
            RestError::RequestBuild(err.to_string())
        } else if err.is_body() || err.is_decode() {
            RestError::Body(err.to_string())
        } else {
            RestError::Connection(err.to_string())
        }
    }
}
