//! Process-wide registry of cache engines
//!
//! Engines are keyed by namespace and created once for the process
//! lifetime. Each engine owns exactly one eviction sweeper, so handing out
//! shared engines instead of building one per request is what keeps the
//! background task count bounded.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::{EvictionSweeper, SemanticCacheEngine};
use crate::domain::cache::{CacheNamespace, CacheStore};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::semantic_cache::SemanticCacheConfig;

struct EngineSlot {
    engine: Arc<SemanticCacheEngine>,
    sweeper: EvictionSweeper,
}

/// Shared-ownership singleton-per-namespace engine registry.
///
/// Explicitly constructed and passed around, not an ambient global.
pub struct SemanticCacheRegistry {
    store: Arc<dyn CacheStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    config: SemanticCacheConfig,
    engines: Mutex<HashMap<String, EngineSlot>>,
}

impl std::fmt::Debug for SemanticCacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticCacheRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SemanticCacheRegistry {
    pub fn new(
        store: Arc<dyn CacheStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        config: SemanticCacheConfig,
    ) -> Self {
        Self {
            store,
            embeddings,
            config,
            engines: Mutex::new(HashMap::new()),
        }
    }

    /// Engine for a user-scoped namespace, or the global one when no user is
    /// given. Created (with its sweeper) on first use, shared afterwards.
    pub async fn engine_for_user(&self, user_id: Option<i64>) -> Arc<SemanticCacheEngine> {
        let namespace = match user_id {
            Some(user_id) => CacheNamespace::for_user(&self.config.key_prefix, user_id),
            None => CacheNamespace::global(&self.config.key_prefix),
        };

        self.engine_for(namespace).await
    }

    async fn engine_for(&self, namespace: CacheNamespace) -> Arc<SemanticCacheEngine> {
        let mut engines = self.engines.lock().await;

        if let Some(slot) = engines.get(namespace.prefix()) {
            return Arc::clone(&slot.engine);
        }

        debug!(namespace = %namespace.prefix(), "Creating cache engine");

        let engine = Arc::new(SemanticCacheEngine::new(
            Arc::clone(&self.store),
            Arc::clone(&self.embeddings),
            namespace.clone(),
            self.config.clone(),
        ));

        let sweeper = EvictionSweeper::spawn(Arc::clone(&engine), self.config.sweep_interval());

        engines.insert(
            namespace.prefix().to_string(),
            EngineSlot {
                engine: Arc::clone(&engine),
                sweeper,
            },
        );

        engine
    }

    /// Number of live engines (and therefore sweeper tasks)
    pub async fn engine_count(&self) -> usize {
        self.engines.lock().await.len()
    }

    /// Stops every sweeper and joins them
    pub async fn shutdown(&self) {
        let mut engines = self.engines.lock().await;

        for (_, slot) in engines.drain() {
            slot.sweeper.shutdown().await;
        }
    }
}
