//! File-backed store
//!
//! File layout:
//!
//! ```text
//! <crc32 of body, 8 lowercase hex digits>\n
//! <body: JSON-serialized record table>
//! ```
//!
//! Every mutation rewrites the whole file through a temporary sibling:
//! write, fsync, rename into place, fsync the directory. The checksum is
//! verified on open; a mismatch aborts the open instead of starting from an
//! empty table.

use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::records::Records;
use super::{BackingStore, StoreFuture};
use crate::contact::RecordId;
use crate::errors::{GcdsError, GcdsResult};

fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn encode(records: &Records) -> GcdsResult<Vec<u8>> {
    let body = serde_json::to_vec(records)?;
    let mut out = format!("{:08x}\n", compute_checksum(&body)).into_bytes();
    out.extend_from_slice(&body);
    Ok(out)
}

fn decode(path: &Path, bytes: &[u8]) -> GcdsResult<Records> {
    let corrupt = |reason: &str| GcdsError::store(format!("{}: {}", path.display(), reason));

    let split = bytes
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| corrupt("missing checksum header"))?;
    let (header, body) = (&bytes[..split], &bytes[split + 1..]);

    let header = std::str::from_utf8(header).map_err(|_| corrupt("invalid checksum header"))?;
    let expected = u32::from_str_radix(header.trim(), 16).map_err(|_| corrupt("invalid checksum header"))?;
    if compute_checksum(body) != expected {
        return Err(corrupt("checksum mismatch"));
    }

    Ok(serde_json::from_slice(body)?)
}

/// Store persisted to a single file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: Mutex<Records>,
    revision: std::sync::RwLock<String>,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one if the file does not
    /// exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> GcdsResult<Self> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => decode(&path, &bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Records::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), records = records.len(), "file store opened");

        Ok(Self {
            path,
            revision: std::sync::RwLock::new(records.revision()),
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &Records) -> GcdsResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)
            .await?;
        file.write_all(&encode(records)?).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;

        // fsync the directory so the rename itself is durable
        if let Some(parent) = self.path.parent() {
            let dir = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
            if let Ok(dir) = tokio::fs::File::open(dir).await {
                let _ = dir.sync_all().await;
            }
        }
        Ok(())
    }

    /// Apply `f` to a copy of the table, persist it, then adopt it.
    /// A failed write leaves the in-memory table unchanged.
    async fn mutate<T>(&self, f: impl FnOnce(&mut Records) -> T) -> GcdsResult<T> {
        let mut guard = self.records.lock().await;
        let mut next = guard.clone();
        let out = f(&mut next);
        self.persist(&next).await?;
        if let Ok(mut revision) = self.revision.write() {
            *revision = next.revision();
        }
        *guard = next;
        Ok(out)
    }
}

impl BackingStore for FileStore {
    fn get(&self, id: RecordId) -> StoreFuture<'_, Option<Value>> {
        Box::pin(async move { Ok(self.records.lock().await.get(id)) })
    }

    fn get_many<'a>(&'a self, ids: &'a [RecordId]) -> StoreFuture<'a, Vec<Option<Value>>> {
        Box::pin(async move { Ok(self.records.lock().await.get_many(ids)) })
    }

    fn add(&self, value: Value) -> StoreFuture<'_, RecordId> {
        Box::pin(self.mutate(move |r| r.add(value)))
    }

    fn put(&self, value: Value, id: RecordId) -> StoreFuture<'_, ()> {
        Box::pin(self.mutate(move |r| r.put(value, id)))
    }

    fn remove(&self, id: RecordId) -> StoreFuture<'_, ()> {
        Box::pin(self.mutate(move |r| r.remove(id)))
    }

    fn clear(&self) -> StoreFuture<'_, ()> {
        Box::pin(self.mutate(|r| r.clear()))
    }

    fn revision_id(&self) -> String {
        self.revision.read().map(|r| r.clone()).unwrap_or_default()
    }
}
