pub mod backfill;
pub mod profile;
pub mod service;

pub use service::{
    CachingEmbeddingService, OpenAiEmbeddingBackend, EMBEDDING_DIMENSIONS, EMBEDDING_VERSION,
};
