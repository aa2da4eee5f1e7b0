//! Semantic cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for semantic response caching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Whether semantic caching is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Similarity threshold for cache hits (0.0 to 1.0)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Maximum number of entries per namespace; the eviction sweeper
    /// trims least-recently-accessed entries beyond this
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Time-to-live for cached entries in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Interval between eviction sweeps in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Key prefix identifying this cache in the store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Embedding model used for similarity vectors
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Characters per synthetic chunk when replaying a cached response
    #[serde(default = "default_replay_chunk_chars")]
    pub replay_chunk_chars: usize,

    /// Delay between synthetic chunks in milliseconds
    #[serde(default = "default_replay_chunk_delay_ms")]
    pub replay_chunk_delay_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_similarity_threshold() -> f32 {
    0.8
}

fn default_max_entries() -> usize {
    1000
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_key_prefix() -> String {
    "ai-assist".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_replay_chunk_chars() -> usize {
    4
}

fn default_replay_chunk_delay_ms() -> u64 {
    50
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            similarity_threshold: default_similarity_threshold(),
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            key_prefix: default_key_prefix(),
            embedding_model: default_embedding_model(),
            replay_chunk_chars: default_replay_chunk_chars(),
            replay_chunk_delay_ms: default_replay_chunk_delay_ms(),
        }
    }
}

impl SemanticCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry TTL as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Sweep interval as a Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Delay between replayed chunks as a Duration
    pub fn replay_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.replay_chunk_delay_ms)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_secs = interval.as_secs();
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_replay_chunk_chars(mut self, chars: usize) -> Self {
        self.replay_chunk_chars = chars.max(1);
        self
    }

    pub fn with_replay_chunk_delay(mut self, delay: Duration) -> Self {
        self.replay_chunk_delay_ms = delay.as_millis() as u64;
        self
    }
}
