//! Cache store abstraction and key scheme

mod key;
mod store;

pub use key::{content_hash, hash_from_key, CacheNamespace};
pub use store::CacheStore;

#[cfg(test)]
pub use store::mock::MockStore;
