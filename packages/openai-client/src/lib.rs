//! Pure OpenAI REST API client
//!
//! A minimal client for the OpenAI API with no domain-specific logic.
//! Supports chat completions, strict structured outputs, and embeddings
//! (single and batch).
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{ChatRequest, Message, OpenAiClient};
//!
//! let client = OpenAiClient::from_env()?;
//!
//! let response = client.chat_completion(ChatRequest::new("gpt-4o-mini")
//!     .message(Message::user("Hello!"))).await?;
//!
//! let vector = client.create_embedding("text to embed", "text-embedding-3-small").await?;
//! ```
//!
//! # Type-safe structured output
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Listing {
//!     title: String,
//!     company: String,
//! }
//!
//! // Schema generated automatically from the type.
//! let listing: Listing = client.extract("gpt-4o-mini", system_prompt, user_prompt).await?;
//! ```

pub mod error;
pub mod schema;
pub mod types;

pub use error::{OpenAiError, Result};
pub use schema::StructuredOutput;
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a new client with the given API key and a 30 second request
    /// timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_timeout(api_key, Duration::from_secs(30))
    }

    /// Create a new client with an explicit per-request timeout.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAiError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, path, "OpenAI request failed");
                OpenAiError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, path, "OpenAI API error");
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Chat completion.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();
        let response = self.post_json("/chat/completions", &request).await?;

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAiError::Parse(e.to_string()))?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| OpenAiError::Parse("no choices in response".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: raw.usage,
        })
    }

    /// Structured output with a JSON schema; returns the raw JSON string.
    pub async fn structured_output(&self, request: StructuredRequest) -> Result<String> {
        let response = self.post_json("/chat/completions", &request).await?;

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAiError::Parse(e.to_string()))?;

        raw.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| OpenAiError::Parse("no choices in response".into()))
    }

    /// Type-safe structured extraction.
    ///
    /// Generates a JSON schema from `T` with `schemars`, sends it through the
    /// `json_schema` strict response format, and deserializes the result.
    pub async fn extract<T: StructuredOutput>(
        &self,
        model: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let schema = T::openai_schema();

        debug!(type_name = %T::type_name(), model, "structured extraction");

        let request = StructuredRequest::new(model, system_prompt, user_prompt, schema);
        let json = self.structured_output(request).await?;

        serde_json::from_str(&json)
            .map_err(|e| OpenAiError::Parse(format!("response does not match schema: {}", e)))
    }

    /// Create an embedding for a single text.
    ///
    /// Returns a vector (1536 dimensions for text-embedding-3-small).
    pub async fn create_embedding(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let mut vectors = self.create_embeddings(&[text.to_string()], model).await?;
        vectors
            .pop()
            .ok_or_else(|| OpenAiError::Parse("no embedding in response".into()))
    }

    /// Create embeddings for multiple texts in one API call.
    ///
    /// Output order matches input order (the API reports indexes, which are
    /// used to re-sort in case they arrive shuffled).
    pub async fn create_embeddings(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = types::EmbeddingRequest {
            model: model.to_string(),
            input: texts.to_vec(),
        };

        let response = self.post_json("/embeddings", &request).await?;

        let parsed: types::EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| OpenAiError::Parse(e.to_string()))?;

        if parsed.data.len() != texts.len() {
            return Err(OpenAiError::Parse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builder() {
        let client = OpenAiClient::new("sk-test").with_base_url("https://custom.api.example");
        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url, "https://custom.api.example");
    }

    #[tokio::test]
    async fn empty_batch_short_circuits() {
        let client = OpenAiClient::new("sk-test");
        let vectors = client
            .create_embeddings(&[], "text-embedding-3-small")
            .await
            .unwrap();
        assert!(vectors.is_empty());
    }
}
