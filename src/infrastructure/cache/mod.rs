//! Cache store implementations

mod in_memory;
mod redis;

pub use in_memory::{InMemoryStore, InMemoryStoreConfig};
pub use redis::{RedisStore, RedisStoreConfig};
