//! Datastore providers
//!
//! A provider is the platform capability that hands out a named backing
//! store. Returning `None` means the capability is not available for that
//! name.

use std::path::PathBuf;
use std::sync::Arc;

use super::{BackingStore, FileStore, StoreFuture};

/// Opens backing stores by name
pub trait DatastoreProvider: Send + Sync {
    fn open<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<Arc<dyn BackingStore>>>;
}

/// Provider handing out one pre-built store for every name
pub struct StaticProvider {
    store: Arc<dyn BackingStore>,
}

impl StaticProvider {
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self { store }
    }
}

impl DatastoreProvider for StaticProvider {
    fn open<'a>(&'a self, _name: &'a str) -> StoreFuture<'a, Option<Arc<dyn BackingStore>>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move { Ok(Some(store)) })
    }
}

/// Provider opening `<dir>/<name>.json` file stores
#[derive(Debug, Clone)]
pub struct FileProvider {
    dir: PathBuf,
}

impl FileProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing the store called `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl DatastoreProvider for FileProvider {
    fn open<'a>(&'a self, name: &'a str) -> StoreFuture<'a, Option<Arc<dyn BackingStore>>> {
        Box::pin(async move {
            let store = FileStore::open(self.path_for(name)).await?;
            Ok(Some(Arc::new(store) as Arc<dyn BackingStore>))
        })
    }
}
