//! AI Assist generation core
//!
//! Semantic response caching and streaming generation for a chat-assistant
//! backend:
//! - Per-user semantic caches over a TTL key-value store (in-memory or
//!   Redis), matched by embedding cosine similarity instead of exact text
//! - Background least-recently-accessed eviction, one sweeper per cache
//!   namespace, bounded by a process-wide engine registry
//! - Interchangeable upstream providers (DeepSeek, Ollama) behind one
//!   streaming capability
//! - Cache hits replayed as paced SSE chunk streams, indistinguishable in
//!   shape from live generation
//!
//! HTTP routing, authentication, and conversation persistence live outside
//! this crate; the [`CompletionHandler`] callback is the seam to the latter.

pub mod config;
pub mod domain;
pub mod infrastructure;

use std::sync::Arc;

pub use config::AppConfig;
pub use domain::{
    CacheNamespace, CacheStore, DomainError, EmbeddingProvider, LlmProvider, Message, MessageRole,
};
pub use infrastructure::semantic_cache::{
    SemanticCacheEngine, SemanticCacheRegistry, SseStream,
};
pub use infrastructure::services::{ChatService, CompletionHandler};

use config::StoreBackend;
use infrastructure::cache::{InMemoryStore, RedisStore};
use infrastructure::embedding::OllamaEmbeddingProvider;
use infrastructure::llm::{HttpClient, LlmProviderFactory};

/// Wired application core: the chat service plus the cache registry owning
/// the background eviction tasks. Call [`SemanticCacheRegistry::shutdown`]
/// on teardown to join the sweepers.
pub struct AppCore {
    pub chat: ChatService,
    pub cache: Arc<SemanticCacheRegistry>,
}

/// Builds the application core from configuration
pub async fn bootstrap(config: &AppConfig) -> anyhow::Result<AppCore> {
    let store: Arc<dyn CacheStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
        StoreBackend::Redis => Arc::new(RedisStore::with_url(&config.store.redis_url).await?),
    };

    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(
        OllamaEmbeddingProvider::with_base_url(HttpClient::new(), &config.llm.ollama.base_url),
    );

    let cache = Arc::new(SemanticCacheRegistry::new(
        store,
        embeddings,
        config.cache.clone(),
    ));

    let provider = LlmProviderFactory::create(&config.llm)?;
    let chat = ChatService::new(provider, Arc::clone(&cache));

    Ok(AppCore { chat, cache })
}
