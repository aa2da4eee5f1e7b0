//! Cache namespace and key scheme
//!
//! Every entry is a triple of physically independent records (vector,
//! response, metadata) sharing one content-hash suffix inside a namespace:
//!
//! ```text
//! {prefix}[:{user_id}]:vec:{hash}
//! {prefix}[:{user_id}]:resp:{hash}
//! {prefix}[:{user_id}]:meta:{hash}
//! ```

use sha2::{Digest, Sha256};

const VECTOR_FIELD: &str = "vec";
const RESPONSE_FIELD: &str = "resp";
const METADATA_FIELD: &str = "meta";

/// Deterministic digest identifying one cached entry's triple of records.
///
/// Hashes the exact text of the last user-authored message, not the full
/// message list, so near-duplicate questions collapse to one neighborhood
/// regardless of prior context.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(digest)
}

/// A logical partition of the cache store, scoped globally or per user.
///
/// Every key derived through a namespace carries its prefix, so per-user
/// caches can never collide with each other or with the global cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheNamespace {
    prefix: String,
}

impl CacheNamespace {
    /// Namespace shared by all users
    pub fn global(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Namespace scoped to a single user
    pub fn for_user(prefix: &str, user_id: i64) -> Self {
        Self {
            prefix: format!("{}:{}", prefix, user_id),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn vector_key(&self, hash: &str) -> String {
        format!("{}:{}:{}", self.prefix, VECTOR_FIELD, hash)
    }

    pub fn response_key(&self, hash: &str) -> String {
        format!("{}:{}:{}", self.prefix, RESPONSE_FIELD, hash)
    }

    pub fn metadata_key(&self, hash: &str) -> String {
        format!("{}:{}:{}", self.prefix, METADATA_FIELD, hash)
    }

    /// All three record keys for one entry
    pub fn entry_keys(&self, hash: &str) -> [String; 3] {
        [
            self.vector_key(hash),
            self.response_key(hash),
            self.metadata_key(hash),
        ]
    }

    /// Scan prefix matching every vector record in this namespace
    pub fn vector_scan_prefix(&self) -> String {
        format!("{}:{}:", self.prefix, VECTOR_FIELD)
    }

    /// Scan prefix matching every metadata record in this namespace
    pub fn metadata_scan_prefix(&self) -> String {
        format!("{}:{}:", self.prefix, METADATA_FIELD)
    }
}

/// Extracts the content-hash suffix from a record key
pub fn hash_from_key(key: &str) -> Option<&str> {
    key.rsplit(':').next().filter(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_deterministic() {
        assert_eq!(content_hash("hello"), content_hash("hello"));
        assert_ne!(content_hash("hello"), content_hash("hello!"));
    }

    #[test]
    fn test_content_hash_is_hex_sha256() {
        let hash = content_hash("What is the capital of France?");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_global_namespace_keys() {
        let ns = CacheNamespace::global("ai-assist");

        assert_eq!(ns.vector_key("abc"), "ai-assist:vec:abc");
        assert_eq!(ns.response_key("abc"), "ai-assist:resp:abc");
        assert_eq!(ns.metadata_key("abc"), "ai-assist:meta:abc");
    }

    #[test]
    fn test_user_namespaces_do_not_collide() {
        let a = CacheNamespace::for_user("ai-assist", 1);
        let b = CacheNamespace::for_user("ai-assist", 2);
        let global = CacheNamespace::global("ai-assist");

        assert_ne!(a.vector_key("h"), b.vector_key("h"));
        assert_ne!(a.vector_key("h"), global.vector_key("h"));
        assert!(a.vector_key("h").starts_with(a.vector_scan_prefix().as_str()));
        assert!(!b.vector_key("h").starts_with(a.vector_scan_prefix().as_str()));
    }

    #[test]
    fn test_entry_keys_cover_all_fields() {
        let ns = CacheNamespace::global("ai-assist");
        let keys = ns.entry_keys("deadbeef");

        assert_eq!(keys.len(), 3);
        assert!(keys.iter().all(|k| k.ends_with(":deadbeef")));
    }

    #[test]
    fn test_hash_from_key() {
        assert_eq!(hash_from_key("ai-assist:42:vec:abc123"), Some("abc123"));
        assert_eq!(hash_from_key("no-separator"), Some("no-separator"));
        assert_eq!(hash_from_key("trailing:"), None);
    }
}
