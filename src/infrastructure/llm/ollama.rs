//! Ollama provider (locally served models)

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;

use super::http_client::HttpClientTrait;
use crate::domain::{
    DomainError, FinishReason, LlmProvider, LlmRequest, LlmResponse, LlmStream, Message,
    StreamChunk,
};

const PROVIDER: &str = "ollama";
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Locally served chat provider speaking the Ollama API.
///
/// Streaming responses arrive as newline-delimited JSON objects, one
/// `message.content` fragment per line, with `done: true` on the last line.
#[derive(Debug)]
pub struct OllamaProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
    model: String,
}

impl<C: HttpClientTrait> OllamaProvider<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self::with_base_url(client, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn build_body(&self, request: &LlmRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": request.messages,
            "stream": request.stream,
        });

        if let Some(temp) = request.temperature {
            body["options"] = serde_json::json!({ "temperature": temp });
        }

        body
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OllamaProvider<C> {
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let mut req = request;
        req.stream = false;

        let json = self
            .client
            .post_json(&self.chat_url(), &self.build_body(&req))
            .await
            .map_err(|e| DomainError::upstream(PROVIDER, e.to_string()))?;

        let response: ChatLine = serde_json::from_value(json).map_err(|e| {
            DomainError::upstream(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        let content = response
            .message
            .map(|m| m.content)
            .ok_or_else(|| DomainError::upstream(PROVIDER, "No message in response"))?;

        Ok(LlmResponse::new(self.model.clone(), Message::assistant(content))
            .with_finish_reason(FinishReason::Stop))
    }

    async fn chat_stream(&self, request: LlmRequest) -> Result<LlmStream, DomainError> {
        let mut req = request;
        req.stream = true;

        let byte_stream = self
            .client
            .post_json_stream(&self.chat_url(), &self.build_body(&req))
            .await
            .map_err(|e| DomainError::upstream(PROVIDER, e.to_string()))?;

        let stream = byte_stream
            .map(|result: Result<Bytes, DomainError>| match result {
                Ok(bytes) => parse_ndjson_payload(&String::from_utf8_lossy(&bytes)),
                Err(e) => vec![Err(DomainError::upstream(PROVIDER, e.to_string()))],
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Parses every NDJSON line in one network read; undecodable lines are
/// skipped rather than failing the stream.
fn parse_ndjson_payload(text: &str) -> Vec<Result<StreamChunk, DomainError>> {
    let mut chunks = Vec::new();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let Ok(event) = serde_json::from_str::<ChatLine>(line) else {
            continue;
        };

        if let Some(content) = event.message.map(|m| m.content).filter(|c| !c.is_empty()) {
            chunks.push(Ok(StreamChunk::delta(content)));
        }

        if event.done {
            chunks.push(Ok(StreamChunk::done(FinishReason::Stop)));
        }
    }

    chunks
}

// Ollama wire types

#[derive(Debug, Deserialize)]
struct ChatLine {
    message: Option<LineMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct LineMessage {
    content: String,
}
