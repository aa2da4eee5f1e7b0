use std::fmt::Debug;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use super::response::StreamChunk;
use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Stream type for incremental generation output
pub type LlmStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, DomainError>> + Send>>;

/// Capability shared by all upstream generation backends.
///
/// The orchestrator only depends on this trait; concrete providers (a remote
/// hosted model, a locally served model) are interchangeable behind it.
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// One-shot completion for a message list
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Stream completion tokens for a message list
    async fn chat_stream(&self, request: LlmRequest) -> Result<LlmStream, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
