//! Chat generation orchestrator
//!
//! For each turn: consult the semantic cache; on a hit replay the stored
//! response as a synthetic stream, on a miss stream from the upstream
//! provider, forwarding each delta as it arrives and writing the
//! accumulated text back to the cache. Either way the consumer sees one
//! uniform SSE-framed stream and the completion callback receives the final
//! text for persistence.

use std::sync::Arc;
use std::time::Instant;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{info, warn};

use crate::domain::llm::{LlmProvider, LlmRequest, Message};
use crate::infrastructure::semantic_cache::{
    replay_response, sse_data, SemanticCacheRegistry, SseStream,
};

/// Callback invoked with the final response text once a turn completes.
///
/// This is the only seam to the conversation-persistence layer; the
/// orchestrator itself never touches storage for conversations.
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn on_complete(
        &self,
        user_id: Option<i64>,
        conversation_id: Option<i64>,
        messages: &[Message],
        response: &str,
    );
}

/// Orchestrates one chat turn against the cache and the upstream provider
#[derive(Debug)]
pub struct ChatService {
    provider: Arc<dyn LlmProvider>,
    cache: Arc<SemanticCacheRegistry>,
}

impl ChatService {
    pub fn new(provider: Arc<dyn LlmProvider>, cache: Arc<SemanticCacheRegistry>) -> Self {
        Self { provider, cache }
    }

    /// Streams the response for one turn as SSE data frames.
    ///
    /// Upstream failures are encoded as in-band error frames within the
    /// stream rather than transport-level failures, so output already
    /// emitted is preserved. A client dropping the stream stops emission
    /// but does not cancel a cache write already scheduled.
    pub async fn generate_stream(
        &self,
        messages: Vec<Message>,
        user_id: Option<i64>,
        conversation_id: Option<i64>,
        on_complete: Option<Arc<dyn CompletionHandler>>,
    ) -> SseStream {
        let engine = self.cache.engine_for_user(user_id).await;
        let provider = Arc::clone(&self.provider);

        Box::pin(stream! {
            let started = Instant::now();

            if let Some(cached) = engine.lookup(&messages).await {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Cache hit, replaying stored response"
                );

                let config = engine.config();
                let mut replay = replay_response(
                    cached.clone(),
                    config.replay_chunk_chars,
                    config.replay_chunk_delay(),
                );

                while let Some(frame) = replay.next().await {
                    yield frame;
                }

                if let Some(handler) = &on_complete {
                    handler
                        .on_complete(user_id, conversation_id, &messages, &cached)
                        .await;
                }

                return;
            }

            let request = LlmRequest::builder()
                .messages(messages.clone())
                .stream(true)
                .build();

            let mut upstream = match provider.chat_stream(request).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "Upstream generation failed to start");
                    yield sse_data(&format!("Error generating response: {}", e));
                    return;
                }
            };

            let mut full_response = String::new();

            loop {
                match upstream.next().await {
                    Some(Ok(chunk)) => {
                        let done = chunk.is_done();

                        if let Some(delta) = chunk.delta.filter(|d| !d.is_empty()) {
                            full_response.push_str(&delta);
                            yield sse_data(&delta);
                        }

                        if done {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        // In-band error frame; partial output already sent
                        // stays with the client.
                        warn!(error = %e, "Upstream generation failed mid-stream");
                        yield sse_data(&format!("Error generating response: {}", e));
                        return;
                    }
                    None => break,
                }
            }

            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                provider = provider.provider_name(),
                "Cache miss, response generated upstream"
            );

            // Fire-and-forget write-back from the accumulated state. The
            // spawned task outlives this stream, so a disconnecting client
            // cannot cancel the cache write.
            {
                let engine = Arc::clone(&engine);
                let messages = messages.clone();
                let response = full_response.clone();

                tokio::spawn(async move {
                    engine.update(&messages, &response).await;
                });
            }

            if let Some(handler) = &on_complete {
                handler
                    .on_complete(user_id, conversation_id, &messages, &full_response)
                    .await;
            }
        })
    }
}
