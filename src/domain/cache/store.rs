//! Cache store trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// TTL-keyed key-value store backing the semantic cache.
///
/// Values are opaque string payloads; serialization is owned by the engine.
/// `delete_many` removes a whole entry triple in one call so a partial
/// delete is a backend bug, not an accepted state.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Gets a raw value, `None` if absent or expired
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw value with an expiry deadline
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a set of keys, returning how many existed
    async fn delete_many(&self, keys: &[String]) -> Result<usize, DomainError>;

    /// Enumerates all live `(key, value)` pairs whose key starts with
    /// `prefix`. Order is backend-defined and need not be stable.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, DomainError>;

    /// Remaining TTL for a key, `None` if absent or expired
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Mock store for engine tests.
    ///
    /// Keys iterate in sorted order and TTLs are recorded but never enforced,
    /// which keeps expiry-sensitive tests deterministic.
    #[derive(Debug, Default)]
    pub struct MockStore {
        entries: Mutex<BTreeMap<String, (String, Duration)>>,
        error: Mutex<Option<String>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        /// Flip the store into (or out of) a failing state mid-test
        pub fn set_error(&self, error: Option<String>) {
            *self.error.lock().unwrap() = error;
        }

        pub fn recorded_ttl(&self, key: &str) -> Option<Duration> {
            self.entries
                .lock()
                .unwrap()
                .get(key)
                .map(|(_, ttl)| *ttl)
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::store(error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheStore for MockStore {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.check_error()?;
            Ok(self
                .entries
                .lock()
                .unwrap()
                .get(key)
                .map(|(value, _)| value.clone()))
        }

        async fn set_raw(
            &self,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> Result<(), DomainError> {
            self.check_error()?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), ttl));
            Ok(())
        }

        async fn delete_many(&self, keys: &[String]) -> Result<usize, DomainError> {
            self.check_error()?;
            let mut entries = self.entries.lock().unwrap();
            Ok(keys
                .iter()
                .filter(|key| entries.remove(*key).is_some())
                .count())
        }

        async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, DomainError> {
            self.check_error()?;
            Ok(self
                .entries
                .lock()
                .unwrap()
                .range(prefix.to_string()..)
                .take_while(|(key, _)| key.starts_with(prefix))
                .map(|(key, (value, _))| (key.clone(), value.clone()))
                .collect())
        }

        async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
            self.check_error()?;
            Ok(self.recorded_ttl(key))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_store_roundtrip() {
            let store = MockStore::new();
            store
                .set_raw("ns:vec:a", "[1.0]", Duration::from_secs(60))
                .await
                .unwrap();

            assert_eq!(
                store.get_raw("ns:vec:a").await.unwrap(),
                Some("[1.0]".to_string())
            );
            assert_eq!(store.ttl("ns:vec:a").await.unwrap(), Some(Duration::from_secs(60)));
        }

        #[tokio::test]
        async fn test_mock_store_scan_prefix() {
            let store = MockStore::new();
            let ttl = Duration::from_secs(60);
            store.set_raw("ns:vec:a", "1", ttl).await.unwrap();
            store.set_raw("ns:vec:b", "2", ttl).await.unwrap();
            store.set_raw("ns:resp:a", "x", ttl).await.unwrap();

            let vectors = store.scan_prefix("ns:vec:").await.unwrap();
            assert_eq!(vectors.len(), 2);
            assert!(vectors.iter().all(|(k, _)| k.starts_with("ns:vec:")));
        }

        #[tokio::test]
        async fn test_mock_store_delete_many() {
            let store = MockStore::new();
            let ttl = Duration::from_secs(60);
            store.set_raw("a", "1", ttl).await.unwrap();
            store.set_raw("b", "2", ttl).await.unwrap();

            let removed = store
                .delete_many(&["a".into(), "b".into(), "missing".into()])
                .await
                .unwrap();

            assert_eq!(removed, 2);
            assert_eq!(store.get_raw("a").await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_mock_store_error_state() {
            let store = MockStore::new().with_error("backend offline");
            let result = store.get_raw("any").await;
            assert!(matches!(result, Err(DomainError::StoreUnavailable { .. })));
        }
    }
}
