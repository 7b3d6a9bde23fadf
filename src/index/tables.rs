//! Contact index
//!
//! Five lookup tables plus the per-origin-store mapping, all derived from
//! the merged entries held in the backing store.
//!
//! # Invariants
//!
//! - Every `IndexEntryRef` corresponds to one `OriginReference` present in
//!   some merged entry
//! - Updates occur AFTER backing store writes
//! - Empty buckets are deleted

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::bucket::{IndexEntryRef, RefTable};
use super::lookup::LookupKind;
use crate::contact::{first_name_value, Contact, MergedContactId};
use crate::errors::{GcdsError, GcdsResult};
use crate::normalize::Normalizer;

/// Origin contact id -> merged id, for one origin store
pub type StoreBucket = BTreeMap<String, MergedContactId>;

/// The contact index persisted as a single snapshot record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactIndex {
    #[serde(default)]
    by_store: BTreeMap<String, StoreBucket>,
    #[serde(default)]
    by_tel: RefTable,
    #[serde(default)]
    by_email: RefTable,
    #[serde(default)]
    by_name: RefTable,
    #[serde(default)]
    by_given_name: RefTable,
    #[serde(default)]
    by_family_name: RefTable,
}

/// Keys a contact is filed under for one lookup kind
fn keys_for(contact: &Contact, kind: LookupKind, normalizer: &dyn Normalizer) -> Vec<String> {
    match kind {
        LookupKind::Tel => contact
            .tel
            .iter()
            .flat_map(|t| normalizer.phone_variants(&t.value))
            .collect(),
        LookupKind::Email => contact
            .email
            .iter()
            .filter(|e| !e.value.trim().is_empty())
            .map(|e| e.value.clone())
            .collect(),
        LookupKind::Name | LookupKind::GivenName | LookupKind::FamilyName => {
            let values = match kind {
                LookupKind::Name => &contact.name,
                LookupKind::GivenName => &contact.given_name,
                _ => &contact.family_name,
            };
            first_name_value(values)
                .map(|v| normalizer.normalize_name(v))
                .filter(|v| !v.is_empty())
                .into_iter()
                .collect()
        }
    }
}

impl ContactIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// The table bound to a lookup kind
    pub fn table(&self, kind: LookupKind) -> &RefTable {
        match kind {
            LookupKind::Tel => &self.by_tel,
            LookupKind::Email => &self.by_email,
            LookupKind::Name => &self.by_name,
            LookupKind::GivenName => &self.by_given_name,
            LookupKind::FamilyName => &self.by_family_name,
        }
    }

    fn table_mut(&mut self, kind: LookupKind) -> &mut RefTable {
        match kind {
            LookupKind::Tel => &mut self.by_tel,
            LookupKind::Email => &mut self.by_email,
            LookupKind::Name => &mut self.by_name,
            LookupKind::GivenName => &mut self.by_given_name,
            LookupKind::FamilyName => &mut self.by_family_name,
        }
    }

    /// Entries filed under an already-normalized key
    pub fn lookup(&self, kind: LookupKind, key: &str) -> &[IndexEntryRef] {
        self.table(kind).lookup(key)
    }

    /// Origin-id mapping for one origin store
    pub fn store_bucket(&self, owner: &str) -> Option<&StoreBucket> {
        self.by_store.get(owner)
    }

    /// Resolve the merged id of an origin contact.
    ///
    /// Fails with `DatastoreNotFound` if the owner is unknown and
    /// `NotFound` if the owner has no mapping for `uid`.
    pub fn resolve(&self, owner: &str, uid: &str) -> GcdsResult<MergedContactId> {
        let bucket = self
            .by_store
            .get(owner)
            .ok_or_else(|| GcdsError::DatastoreNotFound { owner: owner.to_string() })?;

        bucket.get(uid).copied().ok_or_else(|| GcdsError::NotFound {
            owner: owner.to_string(),
            uid: uid.to_string(),
        })
    }

    /// File one origin contribution under every table it belongs to.
    pub fn index_contact(
        &mut self,
        contact: &Contact,
        owner: &str,
        uid: &str,
        id: MergedContactId,
        normalizer: &dyn Normalizer,
    ) {
        for kind in LookupKind::ALL {
            for key in keys_for(contact, kind, normalizer) {
                self.table_mut(kind).insert(key, IndexEntryRef::new(id, owner, uid));
            }
        }

        if owner.is_empty() || uid.is_empty() {
            return;
        }
        self.by_store
            .entry(owner.to_string())
            .or_default()
            .insert(uid.to_string(), id);
    }

    /// Remove exactly the entries derivable from `contact`'s fields, one
    /// per key. Returns the number of removed entries.
    pub fn unindex_contact(
        &mut self,
        contact: &Contact,
        owner: &str,
        uid: &str,
        id: MergedContactId,
        normalizer: &dyn Normalizer,
    ) -> usize {
        let mut removed = 0;
        for kind in LookupKind::ALL {
            for key in keys_for(contact, kind, normalizer) {
                if self.table_mut(kind).remove_first(&key, id, owner, uid) {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Remove every lookup entry of one origin contribution, whatever key it
    /// was filed under.
    pub fn strip_contribution(&mut self, id: MergedContactId, owner: &str, uid: &str) -> usize {
        LookupKind::ALL
            .into_iter()
            .map(|kind| self.table_mut(kind).retain(|e| !e.is(id, owner, uid)))
            .sum()
    }

    /// Remove every lookup entry belonging to an origin store.
    pub fn strip_owner(&mut self, owner: &str) -> usize {
        LookupKind::ALL
            .into_iter()
            .map(|kind| self.table_mut(kind).retain(|e| e.owner != owner))
            .sum()
    }

    /// Drop the origin-id mapping, deleting the owner's bucket once empty.
    pub fn remove_store_mapping(&mut self, owner: &str, uid: &str) {
        if let Some(bucket) = self.by_store.get_mut(owner) {
            bucket.remove(uid);
            if bucket.is_empty() {
                self.by_store.remove(owner);
            }
        }
    }

    /// Returns true if no table holds any entry
    pub fn is_empty(&self) -> bool {
        self.by_store.is_empty() && LookupKind::ALL.into_iter().all(|k| self.table(k).is_empty())
    }

    /// Number of lookup entries across all tables pointing at `id`
    pub fn references_to(&self, id: MergedContactId) -> usize {
        LookupKind::ALL
            .into_iter()
            .map(|k| self.table(k).entries().filter(|(_, e)| e.id == id).count())
            .sum()
    }
}
