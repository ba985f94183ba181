//! SDK error types
//!
//! Structured error handling for management API operations.
//! Maps HTTP status codes to specific variants so callers can tell
//! transient failures from credential problems.

/// Errors surfaced by the SDK.
///
/// All variants are string-backed and cheap to clone; a single failed
/// token refresh is delivered to every caller that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("authentication expired or rejected")]
    AuthExpired,

    #[error("credentials rejected: {0}")]
    BadCredentials(String),

    #[error("rate limited — try again after backoff")]
    RateLimited,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("server error ({0}): {1}")]
    Server(u16, String),

    #[error("request timeout")]
    Timeout,

    #[error("malformed response: {0}")]
    Protocol(String),

    #[error("request error: {0}")]
    Request(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether a retry at the transport layer could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::RateLimited
                | Error::Timeout
                | Error::Network(_)
                | Error::Server(_, _)
                | Error::AuthExpired
        )
    }

    /// Create an Error from an HTTP status code and response body
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => Error::AuthExpired,
            403 => Error::BadCredentials(body.to_string()),
            404 => Error::NotFound(body.to_string()),
            408 => Error::Timeout,
            429 => Error::RateLimited,
            500..=599 => Error::Server(status, body.to_string()),
            _ => Error::Request(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Network(err.to_string())
        } else if err.is_decode() {
            Error::Protocol(err.to_string())
        } else {
            Error::Request(err.to_string())
        }
    }
}
