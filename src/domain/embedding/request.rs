//! Embedding request and response types

use serde::{Deserialize, Serialize};

/// Request to embed a single text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    model: String,
    input: String,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Response from an embedding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    model: String,
    embeddings: Vec<Vec<f32>>,
}

impl EmbeddingResponse {
    pub fn new(model: impl Into<String>, embeddings: Vec<Vec<f32>>) -> Self {
        Self {
            model: model.into(),
            embeddings,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// First embedding in the response; single-input requests use this one.
    pub fn first(&self) -> Option<&[f32]> {
        self.embeddings.first().map(|v| v.as_slice())
    }

    /// Consume the response, returning the first vector
    pub fn into_first(self) -> Option<Vec<f32>> {
        self.embeddings.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_request() {
        let request = EmbeddingRequest::new("nomic-embed-text", "hello world");
        assert_eq!(request.model(), "nomic-embed-text");
        assert_eq!(request.input(), "hello world");
    }

    #[test]
    fn test_embedding_response_first() {
        let response =
            EmbeddingResponse::new("nomic-embed-text", vec![vec![0.1, 0.2], vec![0.3, 0.4]]);

        assert_eq!(response.first(), Some(&[0.1, 0.2][..]));
        assert_eq!(response.into_first(), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn test_embedding_response_empty() {
        let response = EmbeddingResponse::new("nomic-embed-text", vec![]);
        assert_eq!(response.first(), None);
    }
}
