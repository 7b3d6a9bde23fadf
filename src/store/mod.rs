//! Backing store subsystem
//!
//! The backing store is the durable, record-id keyed home of the merged
//! entries and of the index snapshot. It is reached through the
//! `BackingStore` capability so the manager never depends on a concrete
//! storage engine.
//!
//! # Implementations
//!
//! - `MemoryStore`: in-process, with write counters and failure injection
//! - `FileStore`: one checksummed JSON file, rewritten atomically per write

mod file;
mod handle;
mod memory;
mod provider;
mod records;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::contact::RecordId;
use crate::errors::GcdsResult;

pub use file::FileStore;
pub use handle::StoreHandle;
pub use memory::MemoryStore;
pub use provider::{DatastoreProvider, FileProvider, StaticProvider};

/// Boxed future returned by store capabilities
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = GcdsResult<T>> + Send + 'a>>;

/// Durable key-value store holding merged entries and the index snapshot
pub trait BackingStore: Send + Sync {
    /// Fetch one record; `None` if absent
    fn get(&self, id: RecordId) -> StoreFuture<'_, Option<Value>>;

    /// Fetch several records positionally; one slot per requested id
    fn get_many<'a>(&'a self, ids: &'a [RecordId]) -> StoreFuture<'a, Vec<Option<Value>>>;

    /// Store a new record and return its freshly assigned id
    fn add(&self, value: Value) -> StoreFuture<'_, RecordId>;

    /// Create or overwrite the record at `id`
    fn put(&self, value: Value, id: RecordId) -> StoreFuture<'_, ()>;

    /// Delete the record at `id`
    fn remove(&self, id: RecordId) -> StoreFuture<'_, ()>;

    /// Delete every record
    fn clear(&self) -> StoreFuture<'_, ()>;

    /// Identifier of the current store revision; changes on every mutation
    fn revision_id(&self) -> String;
}
