//! Semantic cache engine, eviction, registry, and stream replay

mod engine;
mod registry;
mod replay;
mod sweeper;

pub use engine::SemanticCacheEngine;
pub use registry::SemanticCacheRegistry;
pub use replay::{replay_response, sse_data, SseStream};
pub use sweeper::EvictionSweeper;
