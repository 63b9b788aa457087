// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. Domain functions
// (enrichment, matching, dispatch) take these through `ServerDeps` so tests
// can substitute fakes.
//
// Naming convention: Base* for trait names (e.g., BaseChatModel)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// =============================================================================
// Chat Model (Infrastructure - structured LLM extraction)
// =============================================================================

/// Failure modes of a model call, split by retryability.
///
/// Transient failures (timeouts, 5xx, rate limits) are retried with back-off
/// by the enrichment worker; fatal ones are recorded against the record and
/// left for a later batch.
#[derive(Debug, Error)]
pub enum ModelCallError {
    #[error("transient model error: {0}")]
    Transient(String),

    #[error("model error: {0}")]
    Fatal(String),
}

#[async_trait]
pub trait BaseChatModel: Send + Sync {
    /// Run a structured extraction and return the raw JSON string.
    ///
    /// The schema is enforced provider-side where supported; callers still
    /// validate by deserializing into their target type.
    async fn extract_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: serde_json::Value,
    ) -> std::result::Result<String, ModelCallError>;
}

// =============================================================================
// Embedding Service (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseEmbeddingService: Send + Sync {
    /// Generate an embedding for one text (1536-dimensional vector).
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts. Output order matches input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Version stamp persisted next to every vector. Vectors from different
    /// versions must never be compared.
    fn version(&self) -> i32;
}

// =============================================================================
// Messenger (Infrastructure - outbound chat)
// =============================================================================

/// Outbound send failure, split by the provider contract: 4xx responses are
/// permanent (bad number, template violation) and must not be retried.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("permanent send failure: {0}")]
    Permanent(String),

    #[error("retryable send failure: {0}")]
    Retryable(String),
}

#[async_trait]
pub trait BaseMessenger: Send + Sync {
    /// Send a plain text message to a contact handle.
    async fn send_text(&self, to: &str, body: &str) -> std::result::Result<(), SendError>;
}

// =============================================================================
// Clock (Infrastructure - injected time)
// =============================================================================

/// All time reads go through this so window thresholds and reminder cascades
/// are deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
