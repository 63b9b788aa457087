//! Error types for the OpenAI client.

use thiserror::Error;

/// Result type for OpenAI client operations.
pub type Result<T> = std::result::Result<T, OpenAiError>;

/// OpenAI client errors.
///
/// `Api` carries the HTTP status so callers can distinguish deterministic
/// failures (4xx, do not retry) from transient ones (5xx / `Network`).
#[derive(Debug, Error)]
pub enum OpenAiError {
    /// Configuration error (missing API key, invalid settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response from the API
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Parse error (invalid JSON, unexpected response shape)
    #[error("parse error: {0}")]
    Parse(String),
}

impl OpenAiError {
    /// Whether retrying the same request can plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            OpenAiError::Network(_) => true,
            OpenAiError::Api { status, .. } => *status >= 500 || *status == 429,
            OpenAiError::Config(_) | OpenAiError::Parse(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = OpenAiError::Api {
            status: 503,
            body: "overloaded".into(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = OpenAiError::Api {
            status: 400,
            body: "bad request".into(),
        };
        assert!(!err.is_transient());
        assert!(!OpenAiError::Parse("oops".into()).is_transient());
    }

    #[test]
    fn rate_limits_are_transient() {
        let err = OpenAiError::Api {
            status: 429,
            body: "slow down".into(),
        };
        assert!(err.is_transient());
    }
}
