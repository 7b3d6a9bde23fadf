//! Merged contact assembly
//!
//! Folds the origin references of one merged entry into the value handed
//! back to lookup callers.

use std::future::ready;

use serde::{Deserialize, Serialize};

use crate::contact::{MergedContactId, OriginReference};
use crate::store::StoreFuture;

/// A merged contact as returned by lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedContact {
    pub id: MergedContactId,
    pub entries: Vec<OriginReference>,
}

impl MergedContact {
    /// Returns true if `uid` of `owner` contributes to this contact
    pub fn contains(&self, owner: &str, uid: &str) -> bool {
        self.entries.iter().any(|e| e.is(owner, uid))
    }
}

/// Builds a `MergedContact` out of a stored entry list
pub trait ContactAssembler: Send + Sync {
    fn assemble(&self, id: MergedContactId, entries: Vec<OriginReference>) -> StoreFuture<'_, MergedContact>;
}

/// Assembler returning the merged id with its origin references as stored
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryAssembler;

impl ContactAssembler for EntryAssembler {
    fn assemble(&self, id: MergedContactId, entries: Vec<OriginReference>) -> StoreFuture<'_, MergedContact> {
        Box::pin(ready(Ok(MergedContact { id, entries })))
    }
}
