//! DeepSeek provider (remote hosted, OpenAI-compatible API)

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::http_client::HttpClientTrait;
use crate::domain::{
    DomainError, FinishReason, LlmProvider, LlmRequest, LlmResponse, LlmStream, Message,
    MessageRole, StreamChunk,
};

const PROVIDER: &str = "deepseek";
const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Remote hosted chat provider speaking the OpenAI-compatible wire format
#[derive(Debug)]
pub struct DeepseekProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
    model: String,
}

impl<C: HttpClientTrait> DeepseekProvider<C> {
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

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_body(&self, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<WireMessage> = request.messages.iter().map(WireMessage::from).collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": request.stream,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for DeepseekProvider<C> {
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let mut req = request;
        req.stream = false;

        let json = self
            .client
            .post_json(&self.chat_completions_url(), &self.build_body(&req))
            .await
            .map_err(|e| DomainError::upstream(PROVIDER, e.to_string()))?;

        let response: ChatResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::upstream(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::upstream(PROVIDER, "No choices in response"))?;

        let mut llm_response = LlmResponse::new(
            response.model,
            Message::assistant(choice.message.content.unwrap_or_default()),
        );

        if let Some(reason) = choice.finish_reason {
            llm_response = llm_response.with_finish_reason(parse_finish_reason(&reason));
        }

        Ok(llm_response)
    }

    async fn chat_stream(&self, request: LlmRequest) -> Result<LlmStream, DomainError> {
        let mut req = request;
        req.stream = true;

        let byte_stream = self
            .client
            .post_json_stream(&self.chat_completions_url(), &self.build_body(&req))
            .await
            .map_err(|e| DomainError::upstream(PROVIDER, e.to_string()))?;

        let stream = byte_stream
            .map(|result: Result<Bytes, DomainError>| match result {
                Ok(bytes) => parse_sse_payload(&String::from_utf8_lossy(&bytes)),
                Err(e) => vec![Err(DomainError::upstream(PROVIDER, e.to_string()))],
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Parses every `data:` line in one network read.
///
/// A single read can carry several SSE events, so this returns all of them
/// in arrival order rather than just the first.
fn parse_sse_payload(text: &str) -> Vec<Result<StreamChunk, DomainError>> {
    let mut chunks = Vec::new();

    for line in text.lines() {
        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };

        if data.trim() == "[DONE]" {
            chunks.push(Ok(StreamChunk::done(FinishReason::Stop)));
            continue;
        }

        let Ok(event) = serde_json::from_str::<StreamEvent>(data) else {
            continue;
        };

        if let Some(choice) = event.choices.into_iter().next() {
            if let Some(delta) = choice.delta.content {
                chunks.push(Ok(StreamChunk::delta(delta)));
            }

            if let Some(reason) = choice.finish_reason {
                chunks.push(Ok(StreamChunk::done(parse_finish_reason(&reason))));
            }
        }
    }

    chunks
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "length" => FinishReason::Length,
        _ => FinishReason::Stop,
    }
}

// DeepSeek wire types

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        Self {
            role,
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}
