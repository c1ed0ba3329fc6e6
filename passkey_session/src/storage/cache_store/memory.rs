use async_trait::async_trait;
use std::collections::HashMap;

use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

use super::types::{CacheStore, InMemoryCacheStore};

const CACHE_PREFIX: &str = "cache";

impl InMemoryCacheStore {
    pub(crate) fn new() -> Self {
        tracing::info!("Creating new in-memory cache store");
        Self {
            entry: HashMap::new(),
        }
    }

    fn make_key(prefix: &str, key: &str) -> String {
        format!("{CACHE_PREFIX}:{prefix}:{key}")
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(()) // Nothing to initialize for in-memory store
    }

    // TTL is not enforced here; entries carry their own expiry and are
    // validated and evicted by the caller on read.
    async fn put_with_ttl(
        &mut self,
        prefix: &str,
        key: &str,
        value: CacheData,
        _ttl: usize,
    ) -> Result<(), StorageError> {
        let key = Self::make_key(prefix, key);
        self.entry.insert(key, value);
        Ok(())
    }

    async fn put_if_not_exists(
        &mut self,
        prefix: &str,
        key: &str,
        value: CacheData,
        _ttl: usize,
    ) -> Result<bool, StorageError> {
        let key = Self::make_key(prefix, key);
        if self.entry.contains_key(&key) {
            return Ok(false);
        }
        self.entry.insert(key, value);
        Ok(true)
    }

    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        let key = Self::make_key(prefix, key);
        Ok(self.entry.get(&key).cloned())
    }

    async fn remove(&mut self, prefix: &str, key: &str) -> Result<(), StorageError> {
        let key = Self::make_key(prefix, key);
        self.entry.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_key() {
        let result = InMemoryCacheStore::make_key("challenge", "user123");
        assert_eq!(result, "cache:challenge:user123");
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let mut store = InMemoryCacheStore::new();
        let value = CacheData {
            value: "test value".to_string(),
        };

        store
            .put_with_ttl("test", "key1", value.clone(), 60)
            .await
            .unwrap();

        let retrieved = store.get("test", "key1").await.unwrap();
        assert_eq!(retrieved.unwrap().value, "test value");
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = InMemoryCacheStore::new();
        let retrieved = store.get("test", "no_such_key").await.unwrap();
        assert!(retrieved.is_none());
    }

    #[tokio::test]
    async fn test_put_if_not_exists() {
        let mut store = InMemoryCacheStore::new();
        let first = CacheData {
            value: "first".to_string(),
        };
        let second = CacheData {
            value: "second".to_string(),
        };

        let stored = store
            .put_if_not_exists("test", "key2", first, 60)
            .await
            .unwrap();
        assert!(stored);

        // Second put under the same key must be rejected
        let stored = store
            .put_if_not_exists("test", "key2", second, 60)
            .await
            .unwrap();
        assert!(!stored);

        let retrieved = store.get("test", "key2").await.unwrap().unwrap();
        assert_eq!(retrieved.value, "first");
    }

    #[tokio::test]
    async fn test_remove() {
        let mut store = InMemoryCacheStore::new();
        let value = CacheData {
            value: "value to remove".to_string(),
        };

        store.put_with_ttl("test", "key3", value, 60).await.unwrap();
        store.remove("test", "key3").await.unwrap();

        let retrieved = store.get("test", "key3").await.unwrap();
        assert!(retrieved.is_none());
    }

    #[tokio::test]
    async fn test_remove_nonexistent_is_ok() {
        let mut store = InMemoryCacheStore::new();
        assert!(store.remove("test", "nonexistent").await.is_ok());
    }
}
