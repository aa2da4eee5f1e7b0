//! Infrastructure layer - external service implementations

pub mod cache;
pub mod embedding;
pub mod llm;
pub mod logging;
pub mod semantic_cache;
pub mod services;
