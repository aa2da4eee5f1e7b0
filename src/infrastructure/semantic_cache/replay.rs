//! Stream replay synthesizer
//!
//! Converts a cached full-text response into a paced sequence of SSE data
//! frames so a cache hit is observably the same shape as a live token
//! stream. Consumers never special-case hits against misses.

use std::pin::Pin;
use std::time::Duration;

use async_stream::stream;
use futures::Stream;

/// Lazy, finite, non-restartable sequence of SSE-framed strings
pub type SseStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Frames one chunk of text as an SSE data event: `data: <json>\n\n`
pub fn sse_data(text: &str) -> String {
    // Serializing a &str to JSON cannot fail; the fallback keeps the frame
    // well-formed regardless.
    let encoded = serde_json::to_string(text).unwrap_or_else(|_| String::from("\"\""));
    format!("data: {}\n\n", encoded)
}

/// Replays a cached response as synthetic stream chunks.
///
/// Chunks split on character boundaries (`chunk_chars` characters each, the
/// last one shorter), in original text order, with `delay` before every
/// chunk.
pub fn replay_response(response: String, chunk_chars: usize, delay: Duration) -> SseStream {
    let chunk_chars = chunk_chars.max(1);

    Box::pin(stream! {
        let chars: Vec<char> = response.chars().collect();

        for chunk in chars.chunks(chunk_chars) {
            tokio::time::sleep(delay).await;
            let piece: String = chunk.iter().collect();
            yield sse_data(&piece);
        }
    })
}
