//! Caching embedding service.
//!
//! Wraps a backend embedding service with a process-local LRU cache keyed by
//! a 16-byte content digest. Safe to run per-process without coordination:
//! embeddings are deterministic per model version, so divergent caches can
//! never disagree about a value.

use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use lru::LruCache;
use openai_client::OpenAiClient;
use tokio::sync::Mutex;

use crate::common::content_hash::content_digest;
use crate::kernel::traits::BaseEmbeddingService;

pub const EMBEDDING_DIMENSIONS: usize = 1536;
pub const EMBEDDING_VERSION: i32 = 1;

const DEFAULT_CACHE_CAPACITY: usize = 2048;

/// Direct OpenAI embedding backend, uncached.
pub struct OpenAiEmbeddingBackend {
    client: OpenAiClient,
    model: String,
}

impl OpenAiEmbeddingBackend {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseEmbeddingService for OpenAiEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.client.create_embedding(text, &self.model).await?;
        anyhow::ensure!(
            vector.len() == EMBEDDING_DIMENSIONS,
            "expected {} dimensions, got {}",
            EMBEDDING_DIMENSIONS,
            vector.len()
        );
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.client.create_embeddings(texts, &self.model).await?;
        for vector in &vectors {
            anyhow::ensure!(
                vector.len() == EMBEDDING_DIMENSIONS,
                "expected {} dimensions, got {}",
                EMBEDDING_DIMENSIONS,
                vector.len()
            );
        }
        Ok(vectors)
    }

    fn version(&self) -> i32 {
        EMBEDDING_VERSION
    }
}

/// LRU content-hash cache in front of any embedding backend.
pub struct CachingEmbeddingService {
    inner: Arc<dyn BaseEmbeddingService>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl CachingEmbeddingService {
    pub fn new(inner: Arc<dyn BaseEmbeddingService>) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn BaseEmbeddingService>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl BaseEmbeddingService for CachingEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = content_digest(text);
        if let Some(cached) = self.cache.lock().await.get(&key) {
            return Ok(cached.clone());
        }

        let vector = self.inner.embed(text).await?;
        self.cache.lock().await.put(key, vector.clone());
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let keys: Vec<String> = texts.iter().map(|t| content_digest(t)).collect();

        // Partition into cache hits and cold inputs
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut cold_indexes = Vec::new();
        {
            let mut cache = self.cache.lock().await;
            for (i, key) in keys.iter().enumerate() {
                match cache.get(key) {
                    Some(cached) => results[i] = Some(cached.clone()),
                    None => cold_indexes.push(i),
                }
            }
        }

        // One batch call for all cold inputs
        if !cold_indexes.is_empty() {
            let cold_texts: Vec<String> =
                cold_indexes.iter().map(|&i| texts[i].clone()).collect();
            let vectors = self.inner.embed_batch(&cold_texts).await?;

            let mut cache = self.cache.lock().await;
            for (&i, vector) in cold_indexes.iter().zip(vectors.into_iter()) {
                cache.put(keys[i].clone(), vector.clone());
                results[i] = Some(vector);
            }
        }

        results
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| anyhow::anyhow!("embedding batch left a slot unfilled"))
    }

    fn version(&self) -> i32 {
        self.inner.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockEmbeddingService;

    #[tokio::test]
    async fn repeated_embeds_hit_the_cache() {
        let mock = Arc::new(MockEmbeddingService::new());
        let service = CachingEmbeddingService::new(mock.clone());

        let a = service.embed("hello world").await.unwrap();
        let b = service.embed("hello world").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn normalized_variants_share_a_cache_entry() {
        let mock = Arc::new(MockEmbeddingService::new());
        let service = CachingEmbeddingService::new(mock.clone());

        service.embed("Hello World").await.unwrap();
        service.embed("hello   world").await.unwrap();

        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn batch_only_fetches_cold_inputs() {
        let mock = Arc::new(MockEmbeddingService::new());
        let service = CachingEmbeddingService::new(mock.clone());

        service.embed("warm").await.unwrap();
        let texts = vec!["warm".to_string(), "cold-1".to_string(), "cold-2".to_string()];
        let vectors = service.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        // 1 single call + 2 cold batch entries
        assert_eq!(mock.call_count(), 3);
        assert_eq!(vectors[0], MockEmbeddingService::vector_for("warm"));
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let mock = Arc::new(MockEmbeddingService::new());
        let service = CachingEmbeddingService::new(mock);

        let texts = vec!["a".to_string(), "b".to_string()];
        let vectors = service.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors[0], MockEmbeddingService::vector_for("a"));
        assert_eq!(vectors[1], MockEmbeddingService::vector_for("b"));
    }

    #[tokio::test]
    async fn eviction_respects_capacity() {
        let mock = Arc::new(MockEmbeddingService::new());
        let service = CachingEmbeddingService::with_capacity(mock.clone(), 1);

        service.embed("first").await.unwrap();
        service.embed("second").await.unwrap();
        service.embed("first").await.unwrap(); // evicted, refetched

        assert_eq!(mock.call_count(), 3);
    }
}
