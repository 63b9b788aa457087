//! Rate-limited decorators for the external-call traits.
//!
//! Outbound chat sends are throttled globally to provider limits; model and
//! embedding calls observe per-minute budgets. Back-pressure surfaces as
//! waiting, never as dropped work.

use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};

use crate::kernel::traits::{
    BaseChatModel, BaseEmbeddingService, BaseMessenger, ModelCallError, SendError,
};

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

fn per_second(rate: u32) -> Arc<DirectRateLimiter> {
    let quota = Quota::per_second(NonZeroU32::new(rate.max(1)).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

fn per_minute(rate: u32) -> Arc<DirectRateLimiter> {
    let quota = Quota::per_minute(NonZeroU32::new(rate.max(1)).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Global throttle on outbound chat sends.
pub struct ThrottledMessenger {
    inner: Arc<dyn BaseMessenger>,
    limiter: Arc<DirectRateLimiter>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn BaseMessenger>, sends_per_second: u32) -> Self {
        Self {
            inner,
            limiter: per_second(sends_per_second),
        }
    }
}

#[async_trait]
impl BaseMessenger for ThrottledMessenger {
    async fn send_text(&self, to: &str, body: &str) -> std::result::Result<(), SendError> {
        self.limiter.until_ready().await;
        self.inner.send_text(to, body).await
    }
}

/// Per-minute budget on language-model calls.
pub struct ThrottledChatModel {
    inner: Arc<dyn BaseChatModel>,
    limiter: Arc<DirectRateLimiter>,
}

impl ThrottledChatModel {
    pub fn new(inner: Arc<dyn BaseChatModel>, calls_per_minute: u32) -> Self {
        Self {
            inner,
            limiter: per_minute(calls_per_minute),
        }
    }
}

#[async_trait]
impl BaseChatModel for ThrottledChatModel {
    async fn extract_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: serde_json::Value,
    ) -> std::result::Result<String, ModelCallError> {
        self.limiter.until_ready().await;
        self.inner
            .extract_structured(system_prompt, user_prompt, schema)
            .await
    }
}

/// Per-minute budget on embedding calls.
pub struct ThrottledEmbeddingService {
    inner: Arc<dyn BaseEmbeddingService>,
    limiter: Arc<DirectRateLimiter>,
}

impl ThrottledEmbeddingService {
    pub fn new(inner: Arc<dyn BaseEmbeddingService>, calls_per_minute: u32) -> Self {
        Self {
            inner,
            limiter: per_minute(calls_per_minute),
        }
    }
}

#[async_trait]
impl BaseEmbeddingService for ThrottledEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.limiter.until_ready().await;
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.limiter.until_ready().await;
        self.inner.embed_batch(texts).await
    }

    fn version(&self) -> i32 {
        self.inner.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::SpyMessenger;

    #[tokio::test]
    async fn throttled_messenger_delivers_through_inner() {
        let spy = Arc::new(SpyMessenger::new());
        let throttled = ThrottledMessenger::new(spy.clone(), 100);

        throttled.send_text("234801", "hello").await.unwrap();
        assert_eq!(spy.sent_to("234801"), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn burst_beyond_quota_waits_instead_of_failing() {
        let spy = Arc::new(SpyMessenger::new());
        // Quota of 1000/s: three quick sends all succeed without error
        let throttled = ThrottledMessenger::new(spy.clone(), 1000);

        for i in 0..3 {
            throttled
                .send_text("234801", &format!("m{}", i))
                .await
                .unwrap();
        }
        assert_eq!(spy.sent_to("234801").len(), 3);
    }
}
