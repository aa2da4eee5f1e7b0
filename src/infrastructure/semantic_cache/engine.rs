//! Semantic cache engine: similarity lookup and write-back
//!
//! The engine is strictly best-effort from its caller's point of view.
//! `lookup` and `update` recover every internal failure (embedding, store,
//! serialization) into a miss or a no-op and log it; a cache failure never
//! fails a chat turn.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::cache::{content_hash, hash_from_key, CacheNamespace, CacheStore};
use crate::domain::embedding::{cosine_similarity, EmbeddingProvider, EmbeddingRequest};
use crate::domain::llm::{last_user_message, Message};
use crate::domain::semantic_cache::{EntryMetadata, SemanticCacheConfig};
use crate::domain::DomainError;

/// Semantic response cache over a TTL key-value store.
///
/// One engine owns one namespace. Each entry is three co-located records
/// (vector, response, metadata) sharing a content-hash suffix and one expiry
/// deadline.
#[derive(Debug)]
pub struct SemanticCacheEngine {
    store: Arc<dyn CacheStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    namespace: CacheNamespace,
    config: SemanticCacheConfig,
}

impl SemanticCacheEngine {
    pub fn new(
        store: Arc<dyn CacheStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        namespace: CacheNamespace,
        config: SemanticCacheConfig,
    ) -> Self {
        Self {
            store,
            embeddings,
            namespace,
            config,
        }
    }

    pub fn namespace(&self) -> &CacheNamespace {
        &self.namespace
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    /// Looks up a cached response for the turn's last user message.
    ///
    /// Returns `None` on a genuine miss, on an assistant-only turn, and on
    /// any internal failure: lookup is an optimization, never a correctness
    /// dependency.
    pub async fn lookup(&self, messages: &[Message]) -> Option<String> {
        if !self.config.enabled {
            return None;
        }

        match self.try_lookup(messages).await {
            Ok(response) => response,
            Err(e) => {
                warn!(namespace = %self.namespace.prefix(), error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn try_lookup(&self, messages: &[Message]) -> Result<Option<String>, DomainError> {
        let Some(query) = last_user_message(messages).filter(|m| !m.is_empty()) else {
            return Ok(None);
        };

        let query_vector = self.embed(query).await?;

        let stored = self
            .store
            .scan_prefix(&self.namespace.vector_scan_prefix())
            .await?;

        let mut best: Option<(String, f32)> = None;

        for (key, raw) in stored {
            let Some(hash) = hash_from_key(&key) else {
                continue;
            };

            let Ok(cached_vector) = serde_json::from_str::<Vec<f32>>(&raw) else {
                debug!(key = %key, "Skipping undecodable cached vector");
                continue;
            };

            // A dimensionality mismatch here means the entry was written by a
            // different embedding model; skip it instead of failing the scan.
            let Ok(similarity) = cosine_similarity(&query_vector, &cached_vector) else {
                continue;
            };

            let better = match &best {
                None => true,
                // Equal scores resolve to the smaller hash so the winner does
                // not depend on store enumeration order.
                Some((best_hash, best_score)) => {
                    similarity > *best_score
                        || (similarity == *best_score && hash < best_hash.as_str())
                }
            };

            if better {
                best = Some((hash.to_string(), similarity));
            }
        }

        let Some((hash, similarity)) = best else {
            debug!(namespace = %self.namespace.prefix(), "Cache miss: namespace is empty");
            return Ok(None);
        };

        if similarity < self.config.similarity_threshold {
            debug!(
                similarity,
                threshold = self.config.similarity_threshold,
                "Cache miss: best match below threshold"
            );
            return Ok(None);
        }

        // Fetch the response belonging to the matched entry, not to the
        // query's own hash; near-duplicate hits land on a neighbor's records.
        let Some(response) = self.store.get_raw(&self.namespace.response_key(&hash)).await? else {
            debug!(hash = %hash, "Cache miss: matched vector has no response record");
            return Ok(None);
        };

        self.refresh_metadata(&hash).await;

        info!(
            namespace = %self.namespace.prefix(),
            similarity,
            "Semantic cache hit"
        );

        Ok(Some(response))
    }

    /// Writes the generated response back under the turn's last user message.
    ///
    /// Best-effort: failures (including a partial write of the record
    /// triple) are logged and swallowed so they never propagate into the
    /// caller's response path.
    pub async fn update(&self, messages: &[Message], response: &str) {
        if !self.config.enabled {
            return;
        }

        if let Err(e) = self.try_update(messages, response).await {
            warn!(
                namespace = %self.namespace.prefix(),
                error = %e,
                "Cache update failed; entry may be partially written and will age out via TTL"
            );
        }
    }

    async fn try_update(&self, messages: &[Message], response: &str) -> Result<(), DomainError> {
        let Some(query) = last_user_message(messages).filter(|m| !m.is_empty()) else {
            return Ok(());
        };

        let vector = self.embed(query).await?;
        let hash = content_hash(query);
        let ttl = self.config.ttl();

        let vector_json = serde_json::to_string(&vector)
            .map_err(|e| DomainError::internal(format!("Failed to encode vector: {}", e)))?;
        let metadata_json = serde_json::to_string(&EntryMetadata::new())
            .map_err(|e| DomainError::internal(format!("Failed to encode metadata: {}", e)))?;

        // Three independent record writes sharing one deadline. Each write is
        // retry-safe and idempotent, so a concurrent update of the same hash
        // converges to the last writer.
        self.store
            .set_raw(&self.namespace.vector_key(&hash), &vector_json, ttl)
            .await?;
        self.store
            .set_raw(&self.namespace.response_key(&hash), response, ttl)
            .await?;
        self.store
            .set_raw(&self.namespace.metadata_key(&hash), &metadata_json, ttl)
            .await?;

        debug!(
            namespace = %self.namespace.prefix(),
            hash = %hash,
            "Cached response for query: {}...",
            &query.chars().take(20).collect::<String>()
        );

        Ok(())
    }

    /// Trims the namespace down to the configured maximum entry count,
    /// deleting least-recently-accessed entries first. Returns how many
    /// entries were evicted.
    ///
    /// Store errors on an individual entry are skipped; only enumerating the
    /// namespace itself can fail the pass.
    pub async fn enforce_max_entries(&self) -> Result<usize, DomainError> {
        let metadata = self
            .store
            .scan_prefix(&self.namespace.metadata_scan_prefix())
            .await?;

        let total = metadata.len();
        if total <= self.config.max_entries {
            return Ok(0);
        }

        let mut candidates: Vec<(u64, String)> = metadata
            .into_iter()
            .filter_map(|(key, raw)| {
                let hash = hash_from_key(&key)?.to_string();
                // Undecodable metadata sorts to the front so damaged entries
                // are evicted before live ones and the count stays exact.
                let last_access = serde_json::from_str::<EntryMetadata>(&raw)
                    .map(|m| m.last_access)
                    .unwrap_or(0);

                Some((last_access, hash))
            })
            .collect();

        // (last_access, hash): least recently accessed first, hash as the
        // deterministic tie-break.
        candidates.sort();

        let excess = total - self.config.max_entries;
        let mut evicted = 0;

        for (_, hash) in candidates.into_iter().take(excess) {
            match self
                .store
                .delete_many(&self.namespace.entry_keys(&hash))
                .await
            {
                Ok(_) => evicted += 1,
                Err(e) => {
                    warn!(hash = %hash, error = %e, "Failed to evict cache entry, skipping");
                }
            }
        }

        debug!(
            namespace = %self.namespace.prefix(),
            evicted,
            "Eviction pass complete"
        );

        Ok(evicted)
    }

    /// Number of entries currently in the namespace
    pub async fn entry_count(&self) -> Result<usize, DomainError> {
        Ok(self
            .store
            .scan_prefix(&self.namespace.metadata_scan_prefix())
            .await?
            .len())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let request = EmbeddingRequest::new(&self.config.embedding_model, text);
        let response = self.embeddings.embed(request).await?;

        response
            .into_first()
            .ok_or_else(|| DomainError::embedding("No embedding returned"))
    }

    /// Refreshes an entry's access metadata after a hit. Best-effort and
    /// last-write-wins; metadata only steers eviction.
    async fn refresh_metadata(&self, hash: &str) {
        if let Err(e) = self.try_refresh_metadata(hash).await {
            warn!(hash = %hash, error = %e, "Failed to refresh cache metadata");
        }
    }

    async fn try_refresh_metadata(&self, hash: &str) -> Result<(), DomainError> {
        let metadata_key = self.namespace.metadata_key(hash);

        let metadata = match self
            .store
            .get_raw(&metadata_key)
            .await?
            .and_then(|raw| serde_json::from_str::<EntryMetadata>(&raw).ok())
        {
            Some(mut metadata) => {
                metadata.touch();
                metadata
            }
            // The record expired or got damaged independently; re-seed it.
            None => EntryMetadata::new(),
        };

        // Re-arm with the response record's remaining TTL so the triple
        // keeps sharing one expiry deadline.
        let ttl = self
            .store
            .ttl(&self.namespace.response_key(hash))
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| self.config.ttl());

        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| DomainError::internal(format!("Failed to encode metadata: {}", e)))?;

        self.store.set_raw(&metadata_key, &metadata_json, ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::cache::MockStore;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::llm::Message;

    const CAPITAL_FULL: &str = "What is the capital of France?";
    const CAPITAL_SHORT: &str = "capital of France?";
    const WEATHER: &str = "What is the weather today?";

    fn engine_with(
        store: Arc<MockStore>,
        embeddings: MockEmbeddingProvider,
        config: SemanticCacheConfig,
    ) -> SemanticCacheEngine {
        SemanticCacheEngine::new(
            store,
            Arc::new(embeddings),
            CacheNamespace::for_user(&config.key_prefix, 42),
            config,
        )
    }

    fn default_engine(store: Arc<MockStore>) -> SemanticCacheEngine {
        engine_with(
            store,
            MockEmbeddingProvider::new(16),
            SemanticCacheConfig::default(),
        )
    }

    fn turn(question: &str) -> Vec<Message> {
        vec![
            Message::system("You are a helpful assistant"),
            Message::user(question),
        ]
    }

    #[tokio::test]
    async fn test_update_then_lookup_round_trips_exactly() {
        let store = Arc::new(MockStore::new());
        let engine = default_engine(store);

        let messages = turn("What is the capital of France?");
        let response = "Paris — the \"City of Light\" 🇫🇷\n";

        engine.update(&messages, response).await;

        let cached = engine.lookup(&messages).await;
        assert_eq!(cached.as_deref(), Some(response));
    }

    #[tokio::test]
    async fn test_lookup_update_lookup_no_spurious_miss_at_max_threshold() {
        let store = Arc::new(MockStore::new());
        // A unit basis vector keeps self-similarity exactly 1.0, so even the
        // maximal threshold must accept the just-stored entry.
        let embeddings =
            MockEmbeddingProvider::new(4).with_vector("ping", vec![1.0, 0.0, 0.0, 0.0]);
        let config = SemanticCacheConfig::new().with_similarity_threshold(1.0);
        let engine = engine_with(store, embeddings, config);

        let messages = turn("ping");

        assert_eq!(engine.lookup(&messages).await, None);
        engine.update(&messages, "pong").await;
        assert_eq!(engine.lookup(&messages).await.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn test_threshold_scenario_similar_hits_dissimilar_misses() {
        let store = Arc::new(MockStore::new());
        // cos([1,0], [0.85, 0.527]) = 0.85, cos([1,0], [0.2, 0.98]) = 0.2
        let embeddings = MockEmbeddingProvider::new(2)
            .with_vector(CAPITAL_FULL, vec![1.0, 0.0])
            .with_vector(CAPITAL_SHORT, vec![0.85, 0.526_782_7])
            .with_vector(WEATHER, vec![0.2, 0.979_795_9]);
        let config = SemanticCacheConfig::new().with_similarity_threshold(0.8);
        let engine = engine_with(store, embeddings, config);

        engine.update(&turn(CAPITAL_FULL), "Paris.").await;

        assert_eq!(
            engine.lookup(&turn(CAPITAL_SHORT)).await.as_deref(),
            Some("Paris.")
        );
        assert_eq!(engine.lookup(&turn(WEATHER)).await, None);
    }

    #[tokio::test]
    async fn test_assistant_only_turn_is_a_miss_not_an_error() {
        let store = Arc::new(MockStore::new());
        let engine = default_engine(store);

        let messages = vec![Message::assistant("unprompted")];
        assert_eq!(engine.lookup(&messages).await, None);

        // Update is a no-op for the same reason.
        engine.update(&messages, "ignored").await;
        assert_eq!(engine.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_miss() {
        let store = Arc::new(MockStore::new());
        let embeddings = MockEmbeddingProvider::new(4).with_error("endpoint down");
        let engine = engine_with(store, embeddings, SemanticCacheConfig::default());

        assert_eq!(engine.lookup(&turn("anything")).await, None);
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_miss_and_swallowed_update() {
        let store = Arc::new(MockStore::new().with_error("backend offline"));
        let engine = default_engine(store);

        assert_eq!(engine.lookup(&turn("anything")).await, None);
        // Must not panic or propagate.
        engine.update(&turn("anything"), "response").await;
    }

    #[tokio::test]
    async fn test_hit_refreshes_metadata() {
        let store = Arc::new(MockStore::new());
        let engine = default_engine(Arc::clone(&store));

        let messages = turn("What is the capital of France?");
        engine.update(&messages, "Paris.").await;

        let metadata_key = engine
            .namespace()
            .metadata_key(&content_hash("What is the capital of France?"));

        let before: EntryMetadata =
            serde_json::from_str(&store.get_raw(&metadata_key).await.unwrap().unwrap()).unwrap();

        engine.lookup(&messages).await.unwrap();

        let after: EntryMetadata =
            serde_json::from_str(&store.get_raw(&metadata_key).await.unwrap().unwrap()).unwrap();

        assert_eq!(after.access_count, before.access_count + 1);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.last_access >= before.last_access);
    }

    #[tokio::test]
    async fn test_disabled_engine_never_reads_or_writes() {
        let store = Arc::new(MockStore::new());
        let config = SemanticCacheConfig::new().with_enabled(false);
        let engine = engine_with(
            Arc::clone(&store),
            MockEmbeddingProvider::new(4),
            config,
        );

        let messages = turn("hello");
        engine.update(&messages, "world").await;

        assert_eq!(engine.lookup(&messages).await, None);
        assert!(store.scan_prefix("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_dimension_entries_are_skipped() {
        let store = Arc::new(MockStore::new());
        let engine = default_engine(Arc::clone(&store));

        // A vector written by some other embedding model.
        store
            .set_raw(
                &engine.namespace().vector_key("stale"),
                "[1.0, 2.0]",
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let messages = turn("What is the capital of France?");
        engine.update(&messages, "Paris.").await;

        assert_eq!(engine.lookup(&messages).await.as_deref(), Some("Paris."));
    }

    #[tokio::test]
    async fn test_eviction_keeps_most_recently_accessed() {
        let store = Arc::new(MockStore::new());
        // Orthogonal vectors so evicted questions cannot hit a surviving
        // neighbor's entry.
        let embeddings = MockEmbeddingProvider::new(3)
            .with_vector("first question", vec![1.0, 0.0, 0.0])
            .with_vector("second question", vec![0.0, 1.0, 0.0])
            .with_vector("third question", vec![0.0, 0.0, 1.0]);
        let config = SemanticCacheConfig::new().with_max_entries(2);
        let engine = engine_with(store, embeddings, config);

        for question in ["first question", "second question", "third question"] {
            engine.update(&turn(question), question).await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let evicted = engine.enforce_max_entries().await.unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(engine.entry_count().await.unwrap(), 2);

        // The oldest write goes; the two most recently accessed remain.
        assert_eq!(engine.lookup(&turn("first question")).await, None);
        assert_eq!(
            engine.lookup(&turn("second question")).await.as_deref(),
            Some("second question")
        );
        assert_eq!(
            engine.lookup(&turn("third question")).await.as_deref(),
            Some("third question")
        );
    }

    #[tokio::test]
    async fn test_eviction_is_idempotent() {
        let store = Arc::new(MockStore::new());
        let config = SemanticCacheConfig::new().with_max_entries(1);
        let engine = engine_with(store, MockEmbeddingProvider::new(8), config);

        engine.update(&turn("alpha"), "a").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        engine.update(&turn("beta"), "b").await;

        assert_eq!(engine.enforce_max_entries().await.unwrap(), 1);
        assert_eq!(engine.enforce_max_entries().await.unwrap(), 0);
        assert_eq!(engine.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_eviction_respects_access_recency_not_insertion_order() {
        let store = Arc::new(MockStore::new());
        let embeddings = MockEmbeddingProvider::new(2)
            .with_vector("old insert", vec![1.0, 0.0])
            .with_vector("new insert", vec![0.0, 1.0]);
        let config = SemanticCacheConfig::new().with_max_entries(1);
        let engine = engine_with(store, embeddings, config);

        engine.update(&turn("old insert"), "a").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        engine.update(&turn("new insert"), "b").await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        // A hit on the older entry makes it the most recently accessed.
        engine.lookup(&turn("old insert")).await.unwrap();

        engine.enforce_max_entries().await.unwrap();

        assert_eq!(
            engine.lookup(&turn("old insert")).await.as_deref(),
            Some("a")
        );
        assert_eq!(engine.lookup(&turn("new insert")).await, None);
    }
}
