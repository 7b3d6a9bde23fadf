//! In-memory backing store
//!
//! Used by tests and by embedders that persist elsewhere. Counts writes and
//! can be told to fail upcoming writes, to exercise partial-failure paths.

use std::collections::BTreeMap;
use std::future::ready;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use super::records::Records;
use super::{BackingStore, StoreFuture};
use crate::contact::RecordId;
use crate::errors::{GcdsError, GcdsResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
    writes: AtomicUsize,
    failing_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful mutations (add, put, remove, clear)
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next `n` mutations fail with a store error
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every record, keyed by id
    pub fn dump(&self) -> BTreeMap<RecordId, Value> {
        let Ok(records) = self.records.lock() else {
            return BTreeMap::new();
        };
        records
            .ids()
            .into_iter()
            .filter_map(|id| records.get(id).map(|v| (id, v)))
            .collect()
    }

    fn read<T>(&self, f: impl FnOnce(&Records) -> T) -> GcdsResult<T> {
        let records = self
            .records
            .lock()
            .map_err(|_| GcdsError::Internal("memory store lock poisoned".into()))?;
        Ok(f(&records))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Records) -> T) -> GcdsResult<T> {
        let pending_failures = self.failing_writes.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.failing_writes.store(pending_failures - 1, Ordering::SeqCst);
            return Err(GcdsError::store("injected write failure"));
        }

        let mut records = self
            .records
            .lock()
            .map_err(|_| GcdsError::Internal("memory store lock poisoned".into()))?;
        let out = f(&mut records);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(out)
    }
}

impl BackingStore for MemoryStore {
    fn get(&self, id: RecordId) -> StoreFuture<'_, Option<Value>> {
        Box::pin(ready(self.read(|r| r.get(id))))
    }

    fn get_many<'a>(&'a self, ids: &'a [RecordId]) -> StoreFuture<'a, Vec<Option<Value>>> {
        Box::pin(ready(self.read(|r| r.get_many(ids))))
    }

    fn add(&self, value: Value) -> StoreFuture<'_, RecordId> {
        Box::pin(ready(self.write(|r| r.add(value))))
    }

    fn put(&self, value: Value, id: RecordId) -> StoreFuture<'_, ()> {
        Box::pin(ready(self.write(|r| r.put(value, id))))
    }

    fn remove(&self, id: RecordId) -> StoreFuture<'_, ()> {
        Box::pin(ready(self.write(|r| r.remove(id))))
    }

    fn clear(&self) -> StoreFuture<'_, ()> {
        Box::pin(ready(self.write(|r| r.clear())))
    }

    fn revision_id(&self) -> String {
        self.read(|r| r.revision()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_get_remove() {
        let store = MemoryStore::new();
        let id = store.add(json!([{"uid": "a1", "origin": "X"}])).await.unwrap();

        assert_eq!(store.get(id).await.unwrap().unwrap()[0]["uid"], "a1");

        store.remove(id).await.unwrap();
        assert!(store.get(id).await.unwrap().is_none());
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_store_untouched() {
        let store = MemoryStore::new();
        store.fail_next_writes(1);

        let err = store.put(json!({}), 1).await.unwrap_err();
        assert_eq!(err.code(), "GCDS_STORE_FAILURE");
        assert!(store.is_empty());
        assert_eq!(store.writes(), 0);

        store.put(json!({}), 1).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_revision_changes_on_clear() {
        let store = MemoryStore::new();
        store.add(json!([])).await.unwrap();
        let before = store.revision_id();

        store.clear().await.unwrap();

        assert_ne!(before, store.revision_id());
        assert!(store.dump().is_empty());
    }
}
