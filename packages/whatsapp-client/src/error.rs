//! Error types for the WhatsApp Cloud API client.

use thiserror::Error;

/// Result type for WhatsApp client operations.
pub type Result<T> = std::result::Result<T, WhatsAppError>;

/// WhatsApp client errors.
///
/// The provider contract treats 4xx responses (bad number, template
/// violation) as deterministic failures that must not be retried, while 5xx
/// and network failures are left to the caller's retry policy. `Api` keeps
/// the status so callers can branch on that.
#[derive(Debug, Error)]
pub enum WhatsAppError {
    /// Configuration error (missing credentials)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response from the Graph API
    #[error("WhatsApp API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Parse error (unexpected response or webhook shape)
    #[error("parse error: {0}")]
    Parse(String),
}

impl WhatsAppError {
    /// Whether the caller may retry the send.
    pub fn is_retryable(&self) -> bool {
        match self {
            WhatsAppError::Network(_) => true,
            WhatsAppError::Api { status, .. } => *status >= 500,
            WhatsAppError::Config(_) | WhatsAppError::Parse(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_xx_is_not_retryable() {
        let err = WhatsAppError::Api {
            status: 400,
            body: "invalid recipient".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn five_xx_and_network_are_retryable() {
        assert!(WhatsAppError::Api {
            status: 502,
            body: "bad gateway".into(),
        }
        .is_retryable());
        assert!(WhatsAppError::Network("connection reset".into()).is_retryable());
    }
}
