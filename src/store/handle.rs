//! Store handle lifecycle
//!
//! The handle is acquired lazily. The first caller opens the store and runs
//! the `on_open` hook (index load); every caller arriving while that is in
//! flight awaits the same initialization instead of starting another one.
//! Once loaded, acquisition returns the cached store immediately. A failed
//! initialization leaves the handle unloaded, so the next call retries.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::{BackingStore, DatastoreProvider};
use crate::errors::{GcdsError, GcdsResult};

pub struct StoreHandle {
    provider: Option<Arc<dyn DatastoreProvider>>,
    name: String,
    cell: OnceCell<Arc<dyn BackingStore>>,
}

impl StoreHandle {
    pub fn new(provider: Option<Arc<dyn DatastoreProvider>>, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
            cell: OnceCell::new(),
        }
    }

    /// Name the store is opened under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if a provider capability is present
    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// The store, if acquisition already completed
    pub fn get(&self) -> Option<&Arc<dyn BackingStore>> {
        self.cell.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Acquire the store, running `on_open` exactly once on first success.
    ///
    /// Fails with `DatastoreNotEnabled` when there is no provider or the
    /// provider has no store under this handle's name.
    pub async fn acquire<F, Fut>(&self, on_open: F) -> GcdsResult<&Arc<dyn BackingStore>>
    where
        F: FnOnce(Arc<dyn BackingStore>) -> Fut,
        Fut: Future<Output = GcdsResult<()>>,
    {
        self.cell
            .get_or_try_init(|| async move {
                let provider = self.provider.as_ref().ok_or(GcdsError::DatastoreNotEnabled)?;
                let store = provider
                    .open(&self.name)
                    .await?
                    .ok_or(GcdsError::DatastoreNotEnabled)?;

                on_open(Arc::clone(&store)).await?;
                Ok(store)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StaticProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_missing_provider_is_not_enabled() {
        let handle = StoreHandle::new(None, "gcds");
        let Err(err) = handle.acquire(|_| async { Ok(()) }).await else {
            panic!("acquire without a provider must fail");
        };

        assert_eq!(err.name(), "DatastoreNotEnabled");
        assert!(!handle.is_loaded());
    }

    #[tokio::test]
    async fn test_concurrent_acquire_initializes_once() {
        let provider: Arc<dyn DatastoreProvider> =
            Arc::new(StaticProvider::new(Arc::new(MemoryStore::new())));
        let handle = StoreHandle::new(Some(provider), "gcds");
        let opened = AtomicUsize::new(0);
        let counter = &opened;

        let open_hook = move |_store: Arc<dyn BackingStore>| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<(), GcdsError>(())
        };

        let (a, b, c) = tokio::join!(
            handle.acquire(open_hook),
            handle.acquire(open_hook),
            handle.acquire(open_hook)
        );

        assert!(Arc::ptr_eq(a.unwrap(), b.unwrap()));
        assert!(c.is_ok());
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_open_hook_allows_retry() {
        let provider: Arc<dyn DatastoreProvider> =
            Arc::new(StaticProvider::new(Arc::new(MemoryStore::new())));
        let handle = StoreHandle::new(Some(provider), "gcds");

        let first = handle
            .acquire(|_| async { Err(GcdsError::store("snapshot unreadable")) })
            .await;
        assert!(first.is_err());
        assert!(!handle.is_loaded());

        handle.acquire(|_| async { Ok(()) }).await.unwrap();
        assert!(handle.is_loaded());
    }
}
