//! Server dependencies for domain code (traits for testability)
//!
//! The central dependency container handed to every worker and handler.
//! External services sit behind the `Base*` traits so tests can inject the
//! fakes from `kernel::test_dependencies`.

use std::sync::Arc;

use async_trait::async_trait;
use openai_client::{OpenAiClient, OpenAiError};
use sqlx::PgPool;
use whatsapp_client::{WhatsAppClient, WhatsAppError};

use crate::config::Config;
use crate::kernel::traits::{
    BaseChatModel, BaseEmbeddingService, BaseMessenger, Clock, ModelCallError, SendError,
};

// =============================================================================
// OpenAiClient adapter (implements BaseChatModel)
// =============================================================================

/// Wraps the OpenAI client, mapping client errors onto retryability.
pub struct OpenAiChatModel {
    client: OpenAiClient,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseChatModel for OpenAiChatModel {
    async fn extract_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: serde_json::Value,
    ) -> Result<String, ModelCallError> {
        let request =
            openai_client::StructuredRequest::new(&self.model, system_prompt, user_prompt, schema);
        self.client
            .structured_output(request)
            .await
            .map_err(|e: OpenAiError| {
                if e.is_transient() {
                    ModelCallError::Transient(e.to_string())
                } else {
                    ModelCallError::Fatal(e.to_string())
                }
            })
    }
}

// =============================================================================
// WhatsAppClient adapter (implements BaseMessenger)
// =============================================================================

/// Wraps the WhatsApp client, mapping the provider contract onto `SendError`.
pub struct WhatsAppMessenger(pub Arc<WhatsAppClient>);

impl WhatsAppMessenger {
    pub fn new(client: Arc<WhatsAppClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseMessenger for WhatsAppMessenger {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError> {
        self.0
            .send_text(to, body)
            .await
            .map(|_| ())
            .map_err(|e: WhatsAppError| {
                if e.is_retryable() {
                    SendError::Retryable(e.to_string())
                } else {
                    SendError::Permanent(e.to_string())
                }
            })
    }
}

// =============================================================================
// Runtime settings
// =============================================================================

/// Tunables that domain code reads at runtime, extracted from `Config` so
/// tests can construct them directly.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub min_match_score: f64,
    pub similarity_threshold: f64,
    pub daily_alert_cap: i64,
    pub window_hours: i64,
    pub enrichment_batch_size: i64,
    pub max_alerts_per_batch: usize,
}

impl RuntimeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_match_score: config.min_match_score,
            similarity_threshold: config.similarity_threshold,
            daily_alert_cap: config.daily_alert_cap,
            window_hours: config.window_hours,
            enrichment_batch_size: config.enrichment_batch_size,
            max_alerts_per_batch: config.max_alerts_per_batch,
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            min_match_score: 39.0,
            similarity_threshold: 0.65,
            daily_alert_cap: 10,
            window_hours: 24,
            enrichment_batch_size: 50,
            max_alerts_per_batch: 50,
        }
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to domain code.
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub chat_model: Arc<dyn BaseChatModel>,
    pub embeddings: Arc<dyn BaseEmbeddingService>,
    pub messenger: Arc<dyn BaseMessenger>,
    pub clock: Arc<dyn Clock>,
    pub settings: RuntimeSettings,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        chat_model: Arc<dyn BaseChatModel>,
        embeddings: Arc<dyn BaseEmbeddingService>,
        messenger: Arc<dyn BaseMessenger>,
        clock: Arc<dyn Clock>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            db_pool,
            chat_model,
            embeddings,
            messenger,
            clock,
            settings,
        }
    }
}
