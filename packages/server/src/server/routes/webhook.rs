//! Chat-provider webhook endpoints.
//!
//! GET handles the verification handshake; POST receives message payloads.
//! Every POST body is HMAC-verified against the raw bytes before parsing;
//! a mismatch is a 401, everything else is a 200 so the provider never
//! retries on our processing outcomes.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::{error, info, warn};
use whatsapp_client::{parse_inbound_messages, verify_signature, verify_subscription};

use crate::domains::inbound::handle_inbound_message;
use crate::server::app::AppState;

/// GET /webhook - subscription verification handshake
pub async fn webhook_get_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mode = params.get("hub.mode").map(String::as_str).unwrap_or("");
    let token = params
        .get("hub.verify_token")
        .map(String::as_str)
        .unwrap_or("");
    let challenge = params
        .get("hub.challenge")
        .map(String::as_str)
        .unwrap_or("");

    match verify_subscription(mode, token, challenge, &state.verify_token) {
        Some(challenge) => {
            info!("webhook verified");
            (StatusCode::OK, challenge.to_string())
        }
        None => {
            warn!("webhook verification failed");
            (StatusCode::FORBIDDEN, "Forbidden".to_string())
        }
    }
}

/// POST /webhook - inbound message delivery
pub async fn webhook_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !verify_signature(&body, signature, &state.app_secret) {
        warn!("webhook signature mismatch");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"status": "invalid_signature"})),
        );
    }

    let messages = match parse_inbound_messages(&body) {
        Ok(messages) => messages,
        Err(e) => {
            // Contract: 200 regardless of processing outcome
            warn!(error = %e, "unparseable webhook body");
            return (
                StatusCode::OK,
                Json(serde_json::json!({"status": "ignored"})),
            );
        }
    };

    for message in messages {
        if let Err(e) = handle_inbound_message(&state.deps, &message.from, &message.body).await {
            error!(from = %message.from, error = %e, "inbound handling failed");
        }
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({"status": "received"})),
    )
}
