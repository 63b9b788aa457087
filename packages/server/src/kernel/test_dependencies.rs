// Test doubles for the kernel traits.
//
// Mirrors the production adapters in `deps.rs`; every fake records its calls
// so tests can assert on what domain code did.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::traits::{
    BaseChatModel, BaseEmbeddingService, BaseMessenger, Clock, ModelCallError, SendError,
};

// =============================================================================
// Mock chat model
// =============================================================================

/// Queued-response chat model. Responses are popped front-to-back; an empty
/// queue yields a fatal error so a test that under-provisions fails loudly.
pub struct MockChatModel {
    responses: Mutex<Vec<Result<String, ModelCallError>>>,
    calls: Mutex<Vec<String>>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Ok(response.into()));
        self
    }

    pub fn with_json_response<T: serde::Serialize>(self, data: &T) -> Self {
        let json = serde_json::to_string(data).expect("mock response must serialize");
        self.responses.lock().unwrap().push(Ok(json));
        self
    }

    pub fn with_transient_error(self, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Err(ModelCallError::Transient(message.into())));
        self
    }

    /// All user prompts sent to the model, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_called_with(&self, text: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|p| p.contains(text))
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseChatModel for MockChatModel {
    async fn extract_structured(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _schema: serde_json::Value,
    ) -> Result<String, ModelCallError> {
        self.calls.lock().unwrap().push(user_prompt.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ModelCallError::Fatal("mock has no queued response".into()));
        }
        responses.remove(0)
    }
}

// =============================================================================
// Mock embedding service
// =============================================================================

/// Deterministic fake embeddings: a 1536-dim vector derived from the text's
/// bytes, so equal texts embed equally and different texts (almost always)
/// differ. Records every embedded text.
pub struct MockEmbeddingService {
    calls: Mutex<Vec<String>>,
    version: i32,
}

impl MockEmbeddingService {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            version: 1,
        }
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; 1536];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % 1536] += byte as f32 / 255.0;
        }
        // Unit-normalize like the real model does
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbeddingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEmbeddingService for MockEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut calls = self.calls.lock().unwrap();
        calls.extend(texts.iter().cloned());
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn version(&self) -> i32 {
        self.version
    }
}

// =============================================================================
// Spy messenger
// =============================================================================

/// Records every outbound message; optionally fails sends to given handles.
pub struct SpyMessenger {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<Vec<(String, bool)>>,
}

impl SpyMessenger {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
        }
    }

    /// Make sends to `handle` fail. `permanent` selects the error kind.
    pub fn fail_sends_to(self, handle: impl Into<String>, permanent: bool) -> Self {
        self.failing.lock().unwrap().push((handle.into(), permanent));
        self
    }

    /// All (handle, body) pairs sent, in order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, handle: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == handle)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

impl Default for SpyMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMessenger for SpyMessenger {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError> {
        if let Some((_, permanent)) = self
            .failing
            .lock()
            .unwrap()
            .iter()
            .find(|(handle, _)| handle == to)
        {
            return Err(if *permanent {
                SendError::Permanent("rejected by mock".into())
            } else {
                SendError::Retryable("mock transport down".into())
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

// =============================================================================
// Fixed clock
// =============================================================================

/// A clock that only moves when the test advances it.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_chat_model_pops_responses_in_order() {
        let model = MockChatModel::new()
            .with_response("first")
            .with_response("second");

        let a = model
            .extract_structured("sys", "prompt-a", serde_json::json!({}))
            .await
            .unwrap();
        let b = model
            .extract_structured("sys", "prompt-b", serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(a, "first");
        assert_eq!(b, "second");
        assert!(model.was_called_with("prompt-a"));
    }

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let service = MockEmbeddingService::new();
        let a = service.embed("same text").await.unwrap();
        let b = service.embed("same text").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1536);
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn spy_messenger_records_and_fails() {
        let messenger = SpyMessenger::new().fail_sends_to("bad", true);

        messenger.send_text("good", "hello").await.unwrap();
        let err = messenger.send_text("bad", "hello").await.unwrap_err();

        assert!(matches!(err, SendError::Permanent(_)));
        assert_eq!(messenger.sent_to("good"), vec!["hello".to_string()]);
        assert!(messenger.sent_to("bad").is_empty());
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::at("2025-06-01T00:00:00Z".parse().unwrap());
        let start = clock.now();
        clock.advance(Duration::hours(23));
        assert_eq!(clock.now() - start, Duration::hours(23));
    }
}
