//! Error types for the LLM layer

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to a chat-completion provider
#[derive(Debug, Error)]
pub enum LlmError {
    /// Rejected credentials (HTTP 401/403)
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// HTTP request failures, status 0 when no response was received
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// SSE stream parsing failures
    #[error("Stream error: {0}")]
    StreamError(String),

    /// JSON encoding/decoding issues
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid request parameters or client configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limit exceeded (retry after {retry_after:?})")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Error object returned by the provider
    #[error("Provider error ({code}): {message}")]
    ProviderError { code: String, message: String },
}

impl LlmError {
    /// Whether sending the same request again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimitExceeded { .. } => true,
            LlmError::HttpError { status, .. } => *status == 0 || *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::HttpError {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}
