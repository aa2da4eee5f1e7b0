//! Ollama embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;
use crate::infrastructure::llm::HttpClientTrait;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Embedding provider backed by an Ollama embed endpoint
#[derive(Debug)]
pub struct OllamaEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> OllamaEmbeddingProvider<C> {
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for OllamaEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let body = serde_json::json!({
            "model": request.model(),
            "input": request.input(),
        });

        let json = self
            .client
            .post_json(&self.embed_url(), &body)
            .await
            .map_err(|e| DomainError::embedding(e.to_string()))?;

        let response: EmbedResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::embedding(format!("Failed to parse embed response: {}", e))
        })?;

        if response.embeddings.is_empty() {
            return Err(DomainError::embedding("Embed endpoint returned no vectors"));
        }

        Ok(EmbeddingResponse::new(
            request.model(),
            response.embeddings,
        ))
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::MockHttpClient;

    const TEST_URL: &str = "http://localhost:11434/api/embed";

    #[tokio::test]
    async fn test_embed_uses_first_vector() {
        let mock_response = serde_json::json!({
            "model": "nomic-embed-text",
            "embeddings": [[0.1, 0.2, 0.3], [0.9, 0.9, 0.9]]
        });

        let client = MockHttpClient::new().with_response(TEST_URL, mock_response);
        let provider = OllamaEmbeddingProvider::new(client);

        let response = provider
            .embed(EmbeddingRequest::new("nomic-embed-text", "hello"))
            .await
            .unwrap();

        assert_eq!(response.first(), Some(&[0.1, 0.2, 0.3][..]));
    }

    #[tokio::test]
    async fn test_embed_empty_reply_is_an_error() {
        let mock_response = serde_json::json!({ "embeddings": [] });

        let client = MockHttpClient::new().with_response(TEST_URL, mock_response);
        let provider = OllamaEmbeddingProvider::new(client);

        let result = provider
            .embed(EmbeddingRequest::new("nomic-embed-text", "hello"))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::EmbeddingUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_embed_transport_failure_maps_to_embedding_error() {
        let client = MockHttpClient::new().with_error(TEST_URL, "connection refused");
        let provider = OllamaEmbeddingProvider::new(client);

        let result = provider
            .embed(EmbeddingRequest::new("nomic-embed-text", "hello"))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::EmbeddingUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_an_error() {
        let mock_response = serde_json::json!({ "unexpected": true });

        let client = MockHttpClient::new().with_response(TEST_URL, mock_response);
        let provider = OllamaEmbeddingProvider::new(client);

        let result = provider
            .embed(EmbeddingRequest::new("nomic-embed-text", "hello"))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::EmbeddingUnavailable { .. })
        ));
    }
}
