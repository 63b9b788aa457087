//! WhatsApp Cloud API client
//!
//! A thin client for the Meta Graph API `messages` endpoint plus the webhook
//! verification helpers the inbound side needs. No domain logic: the caller
//! decides what to send and when, this crate only speaks the wire contract.
//!
//! # Example
//!
//! ```rust,ignore
//! use whatsapp_client::{WhatsAppClient, WhatsAppOptions};
//!
//! let client = WhatsAppClient::new(WhatsAppOptions {
//!     access_token: "...".into(),
//!     phone_number_id: "...".into(),
//! });
//! client.send_text("2348012345678", "Hello!").await?;
//! ```

pub mod error;
pub mod webhook;

pub use error::{Result, WhatsAppError};
pub use webhook::{
    parse_inbound_messages, verify_signature, verify_subscription, InboundMessage,
    WebhookEnvelope,
};

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";

/// Credentials for the Cloud API.
#[derive(Debug, Clone)]
pub struct WhatsAppOptions {
    pub access_token: String,
    pub phone_number_id: String,
}

/// WhatsApp Cloud API client.
#[derive(Clone)]
pub struct WhatsAppClient {
    options: WhatsAppOptions,
    http_client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct TextMessageRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

impl WhatsAppClient {
    /// Create a new client with a 10 second send timeout.
    pub fn new(options: WhatsAppOptions) -> Self {
        Self::with_timeout(options, Duration::from_secs(10))
    }

    /// Create a new client with an explicit per-request timeout.
    pub fn with_timeout(options: WhatsAppOptions, timeout: Duration) -> Self {
        Self {
            options,
            http_client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: GRAPH_API_BASE.to_string(),
        }
    }

    /// Override the API base URL (tests, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Send a plain text message. Returns the provider message id.
    ///
    /// Success is any 2xx. A 4xx is a deterministic failure the caller must
    /// not retry; 5xx and network errors are left to the caller's policy.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<String> {
        let url = format!(
            "{}/{}/messages",
            self.base_url, self.options.phone_number_id
        );

        let request = TextMessageRequest {
            messaging_product: "whatsapp",
            to,
            message_type: "text",
            text: TextBody { body },
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.options.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, to, "WhatsApp send failed");
                WhatsAppError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, to, "WhatsApp API error");
            return Err(WhatsAppError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| WhatsAppError::Parse(e.to_string()))?;

        let message_id = parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .unwrap_or_default();

        debug!(to, message_id = %message_id, "WhatsApp message sent");
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_serializes_to_provider_shape() {
        let request = TextMessageRequest {
            messaging_product: "whatsapp",
            to: "2348012345678",
            message_type: "text",
            text: TextBody { body: "hello" },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messaging_product": "whatsapp",
                "to": "2348012345678",
                "type": "text",
                "text": {"body": "hello"}
            })
        );
    }

    #[test]
    fn base_url_override() {
        let client = WhatsAppClient::new(WhatsAppOptions {
            access_token: "token".into(),
            phone_number_id: "123".into(),
        })
        .with_base_url("http://localhost:9000");
        assert_eq!(client.base_url, "http://localhost:9000");
    }
}
