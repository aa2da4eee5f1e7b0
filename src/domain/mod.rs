//! Domain layer - core types, traits, and error taxonomy

pub mod cache;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod semantic_cache;

pub use cache::{content_hash, hash_from_key, CacheNamespace, CacheStore};
pub use embedding::{cosine_similarity, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use error::DomainError;
pub use llm::{
    last_user_message, FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse,
    LlmStream, Message, MessageRole, StreamChunk,
};
pub use semantic_cache::{EntryMetadata, SemanticCacheConfig};
