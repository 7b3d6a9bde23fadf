//! BTreeMap-based lookup tables
//!
//! A table maps a normalized key to the ordered list of index entries that
//! were filed under it. Empty buckets are deleted, never kept.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contact::MergedContactId;

/// Pointer from a lookup table back to one origin contribution of a
/// merged contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexEntryRef {
    /// Merged contact the contribution belongs to
    pub id: MergedContactId,
    /// Owner of the origin datastore
    pub owner: String,
    /// Contact id in the origin datastore
    pub uid: String,
}

impl IndexEntryRef {
    pub fn new(id: MergedContactId, owner: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            id,
            owner: owner.into(),
            uid: uid.into(),
        }
    }

    /// Returns true if this entry belongs to the given triple
    pub fn is(&self, id: MergedContactId, owner: &str, uid: &str) -> bool {
        self.id == id && self.owner == owner && self.uid == uid
    }
}

/// A single lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefTable {
    buckets: BTreeMap<String, Vec<IndexEntryRef>>,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the bucket for `key`.
    pub fn insert(&mut self, key: impl Into<String>, entry: IndexEntryRef) {
        self.buckets.entry(key.into()).or_default().push(entry);
    }

    /// Remove the first entry in `key`'s bucket matching the triple.
    ///
    /// Returns true if an entry was removed.
    pub fn remove_first(&mut self, key: &str, id: MergedContactId, owner: &str, uid: &str) -> bool {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };

        let Some(position) = bucket.iter().position(|e| e.is(id, owner, uid)) else {
            return false;
        };

        bucket.remove(position);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        true
    }

    /// Keep only the entries for which `keep` returns true, dropping
    /// buckets that become empty. Returns the number of removed entries.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&IndexEntryRef) -> bool,
    {
        let mut removed = 0;
        self.buckets.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|e| keep(e));
            removed += before - bucket.len();
            !bucket.is_empty()
        });
        removed
    }

    /// Entries filed under `key`, in insertion order.
    pub fn lookup(&self, key: &str) -> &[IndexEntryRef] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.buckets.contains_key(key)
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Iterate over every entry in every bucket
    pub fn entries(&self) -> impl Iterator<Item = (&str, &IndexEntryRef)> {
        self.buckets
            .iter()
            .flat_map(|(k, bucket)| bucket.iter().map(move |e| (k.as_str(), e)))
    }
}
