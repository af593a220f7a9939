//! In-process store backed by a concurrent map

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::{KvStore, StoreError};

/// In-memory store. Clones share the same map, so two sessions in one process
/// can play against each other through it.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `Unavailable` while set
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_online()?;
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.check_online()?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_online()?;
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn clones_share_entries() {
        let a = MemoryStore::new();
        let b = a.clone();

        a.set("room:abc", "{}".to_string()).await.unwrap();
        assert_eq!(b.get("room:abc").await.unwrap().as_deref(), Some("{}"));

        b.delete("room:abc").await.unwrap();
        assert_eq!(a.get("room:abc").await.unwrap(), None);
        assert!(a.is_empty());
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_offline(true);

        assert!(matches!(store.get("k").await, Err(StoreError::Unavailable(_))));
        assert_err!(store.set("k", "v".to_string()).await);

        store.set_offline(false);
        assert_ok!(store.set("k", "v".to_string()).await);
    }

    #[tokio::test]
    async fn deleting_absent_key_is_ok() {
        let store = MemoryStore::new();
        assert_ok!(store.delete("missing").await);
    }
}
