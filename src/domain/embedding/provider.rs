//! Embedding provider trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Trait for text embedding providers.
///
/// A pure text-to-vector function from the cache's perspective; failures
/// propagate as `EmbeddingUnavailable` and the caller decides whether that
/// degrades to a cache miss or aborts the operation. No retries here.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate an embedding for the given input
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
