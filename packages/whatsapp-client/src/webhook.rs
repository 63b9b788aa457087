//! Webhook envelope types, inbound-message extraction, and verification.
//!
//! The Cloud API delivers inbound traffic as a deeply nested envelope:
//!
//! ```text
//! entry[] -> changes[] -> value { messages[] { from, text { body } } }
//! ```
//!
//! Only `field == "messages"` changes with `type == "text"` messages are of
//! interest here; everything else (statuses, reactions, media) is ignored.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{Result, WhatsAppError};

type HmacSha256 = Hmac<Sha256>;

/// Top-level webhook envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: WebhookValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMessage {
    #[serde(default)]
    pub from: String,
    #[serde(default, rename = "type")]
    pub message_type: String,
    pub text: Option<WebhookText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookText {
    #[serde(default)]
    pub body: String,
}

/// An inbound text message extracted from the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender handle (phone number in international format, no `+`)
    pub from: String,
    /// Message body
    pub body: String,
}

/// Extract all inbound text messages from a raw webhook body.
///
/// Non-text messages and non-`messages` changes are skipped silently; an
/// unparseable body is a `Parse` error (the HTTP handler still answers 200).
pub fn parse_inbound_messages(raw_body: &[u8]) -> Result<Vec<InboundMessage>> {
    let envelope: WebhookEnvelope = serde_json::from_slice(raw_body)
        .map_err(|e| WhatsAppError::Parse(format!("webhook body: {}", e)))?;

    let mut messages = Vec::new();
    for entry in envelope.entry {
        for change in entry.changes {
            if change.field != "messages" {
                continue;
            }
            for message in change.value.messages {
                if message.message_type != "text" {
                    continue;
                }
                let Some(text) = message.text else { continue };
                if message.from.is_empty() || text.body.is_empty() {
                    continue;
                }
                messages.push(InboundMessage {
                    from: message.from,
                    body: text.body,
                });
            }
        }
    }
    Ok(messages)
}

/// Answer the GET verification handshake.
///
/// Returns the challenge to echo when `hub.mode` is `subscribe` and the
/// token matches, `None` otherwise.
pub fn verify_subscription<'a>(
    mode: &str,
    token: &str,
    challenge: &'a str,
    expected_token: &str,
) -> Option<&'a str> {
    if mode == "subscribe" && token == expected_token {
        Some(challenge)
    } else {
        None
    }
}

/// Verify the `X-Hub-Signature-256` header against the raw request body.
///
/// The header carries `sha256=<hex digest>` where the digest is
/// HMAC-SHA-256 over the raw body with the app secret as key.
pub fn verify_signature(raw_body: &[u8], signature_header: &str, app_secret: &str) -> bool {
    let Some(hex_digest) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "entry": [{
            "changes": [{
                "field": "messages",
                "value": {
                    "messages": [
                        {"from": "2348012345678", "type": "text", "text": {"body": "hi"}},
                        {"from": "2348012345678", "type": "image"}
                    ]
                }
            }]
        }]
    }"#;

    #[test]
    fn extracts_text_messages_only() {
        let messages = parse_inbound_messages(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            messages,
            vec![InboundMessage {
                from: "2348012345678".into(),
                body: "hi".into(),
            }]
        );
    }

    #[test]
    fn ignores_non_message_changes() {
        let body = r#"{"entry":[{"changes":[{"field":"statuses","value":{}}]}]}"#;
        let messages = parse_inbound_messages(body.as_bytes()).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn rejects_malformed_body() {
        assert!(parse_inbound_messages(b"not json").is_err());
    }

    #[test]
    fn subscription_verification() {
        assert_eq!(
            verify_subscription("subscribe", "secret", "12345", "secret"),
            Some("12345")
        );
        assert_eq!(
            verify_subscription("subscribe", "wrong", "12345", "secret"),
            None
        );
        assert_eq!(
            verify_subscription("unsubscribe", "secret", "12345", "secret"),
            None
        );
    }

    #[test]
    fn signature_round_trip() {
        let body = b"payload bytes";
        let secret = "app-secret";

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let header = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));

        assert!(verify_signature(body, &header, secret));
        assert!(!verify_signature(b"tampered", &header, secret));
        assert!(!verify_signature(body, &header, "other-secret"));
        assert!(!verify_signature(body, "sha256=zzzz", secret));
        assert!(!verify_signature(body, "md5=abcd", secret));
    }
}
