//! In-memory object store
//!
//! The local/dev and test backend. Tracks put/delete call counts so tests
//! can assert that an unchanged sync issues no writes, and supports
//! per-key fault injection for failure-isolation tests.

use async_trait::async_trait;
use gdp_common::{fingerprint, PipelineError, Result};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{ObjectStore, PutResult};

#[derive(Debug, Clone)]
struct StoredEntry {
    data: Vec<u8>,
    fingerprint: String,
    content_type: Option<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredEntry>>,
    failing_keys: Mutex<HashSet<String>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of put calls issued so far
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of delete calls issued so far
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Make every put/delete against `key` fail
    pub fn fail_key(&self, key: impl Into<String>) {
        self.lock_failing().insert(key.into());
    }

    /// Stored bytes for `key`, if present
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock_objects().get(key).map(|entry| entry.data.clone())
    }

    /// Stored content type for `key`, if present
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.lock_objects().get(key).and_then(|entry| entry.content_type.clone())
    }

    /// All stored keys
    pub fn keys(&self) -> Vec<String> {
        self.lock_objects().keys().cloned().collect()
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredEntry>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_failing(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.failing_keys.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_fault(&self, key: &str, op: &str) -> Result<()> {
        if self.lock_failing().contains(key) {
            return Err(PipelineError::Storage(format!("injected {} failure for '{}'", op, key)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn ensure_bucket(&self) -> Result<()> {
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<BTreeMap<String, String>> {
        Ok(self
            .lock_objects()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| (key.clone(), entry.fingerprint.clone()))
            .collect())
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<String>) -> Result<PutResult> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_fault(key, "put")?;

        let content_fingerprint = fingerprint::fingerprint_bytes(&data);
        let size = data.len() as i64;

        self.lock_objects().insert(
            key.to_string(),
            StoredEntry {
                data,
                fingerprint: content_fingerprint.clone(),
                content_type,
            },
        );

        Ok(PutResult {
            key: key.to_string(),
            fingerprint: content_fingerprint,
            size,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_fault(key, "delete")?;

        self.lock_objects().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_records_fingerprint() {
        let store = MemoryStore::new();
        let result = store.put("bls-data/pr.class", b"hello world".to_vec(), None).await.unwrap();

        assert_eq!(
            result.fingerprint,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );

        let existing = store.list("bls-data/").await.unwrap();
        assert_eq!(existing.get("bls-data/pr.class"), Some(&result.fingerprint));
    }

    #[tokio::test]
    async fn test_list_scoped_to_prefix() {
        let store = MemoryStore::new();
        store.put("bls-data/pr.class", b"a".to_vec(), None).await.unwrap();
        store.put("other/pr.class", b"b".to_vec(), None).await.unwrap();

        let existing = store.list("bls-data/").await.unwrap();
        assert_eq!(existing.len(), 1);
        assert!(existing.contains_key("bls-data/pr.class"));
    }

    #[tokio::test]
    async fn test_delete_removes_object() {
        let store = MemoryStore::new();
        store.put("bls-data/pr.class", b"a".to_vec(), None).await.unwrap();
        store.delete("bls-data/pr.class").await.unwrap();

        assert!(store.list("bls-data/").await.unwrap().is_empty());
        assert_eq!(store.delete_count(), 1);
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryStore::new();
        store.fail_key("bls-data/pr.duration");

        let err = store.put("bls-data/pr.duration", b"a".to_vec(), None).await;
        assert!(matches!(err, Err(PipelineError::Storage(_))));
        assert!(store.get("bls-data/pr.duration").is_none());
    }
}
