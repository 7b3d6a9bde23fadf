//! Global Contacts manager
//!
//! Owns the store handle, the contact index and the dirty flag, and keeps
//! the index consistent with the merged entries in the backing store.
//!
//! # API
//!
//! - `add(origin, uid, contact)` - Merge or create, then index
//! - `remove(origin, uid, contact)` - Drop one origin contribution
//! - `clear(origin)` - Drop one origin store, or everything
//! - `find_by(kind, value)` - Lookup merged contacts
//! - `flush()` - Persist the index snapshot if dirty
//!
//! # Invariants
//!
//! - Index mutations happen only after the backing store write succeeded
//! - The snapshot is only written by `flush` (and on first creation)
//!
//! Two mutations against the same merged contact must not be raced; the
//! manager does not serialize them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assembly::{ContactAssembler, EntryAssembler, MergedContact};
use crate::config::{GcdsConfig, RemovalPolicy};
use crate::contact::{Contact, MergedContactId, OriginReference, OriginStore, RecordId};
use crate::errors::{GcdsError, GcdsResult};
use crate::index::{ContactIndex, IndexEntryRef, LookupKind};
use crate::matcher::{ContactDataProvider, ContactMatcher, ExactMatcher, MatchMode, MatchOutcome};
use crate::normalize::{DefaultNormalizer, Normalizer};
use crate::observability::{log_event, Event};
use crate::store::{BackingStore, DatastoreProvider, StaticProvider, StoreFuture, StoreHandle};

/// Legacy lookup request: the first `filter_by` field is searched for
/// `filter_value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOptions {
    pub filter_by: Vec<String>,
    pub filter_value: String,
}

impl FindOptions {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            filter_by: vec![field.into()],
            filter_value: value.into(),
        }
    }
}

/// Decode a merged entry record.
///
/// Anything but a list of origin references is a corrupt record.
fn parse_entries(id: MergedContactId, value: Value) -> GcdsResult<Vec<OriginReference>> {
    if !value.is_array() {
        return Err(GcdsError::CorruptEntry { id });
    }
    serde_json::from_value(value).map_err(|_| GcdsError::CorruptEntry { id })
}

pub struct GlobalContacts {
    config: GcdsConfig,
    handle: StoreHandle,
    index: RwLock<Option<ContactIndex>>,
    dirty: AtomicBool,
    matcher: Arc<dyn ContactMatcher>,
    normalizer: Arc<dyn Normalizer>,
    assembler: Arc<dyn ContactAssembler>,
}

impl GlobalContacts {
    /// Create a manager. Without a provider every store operation fails
    /// with `DatastoreNotEnabled`.
    pub fn new(config: GcdsConfig, provider: Option<Arc<dyn DatastoreProvider>>) -> Self {
        let handle = StoreHandle::new(provider, config.datastore_name.clone());
        Self {
            config,
            handle,
            index: RwLock::new(None),
            dirty: AtomicBool::new(false),
            matcher: Arc::new(ExactMatcher),
            normalizer: Arc::new(DefaultNormalizer),
            assembler: Arc::new(EntryAssembler),
        }
    }

    /// Manager over one pre-built store with default configuration
    pub fn with_store(store: Arc<dyn BackingStore>) -> Self {
        Self::new(GcdsConfig::default(), Some(Arc::new(StaticProvider::new(store))))
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn ContactMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_assembler(mut self, assembler: Arc<dyn ContactAssembler>) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn config(&self) -> &GcdsConfig {
        &self.config
    }

    /// True if the index changed since the last flush
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Current store revision; `None` until the store was acquired
    pub fn revision_id(&self) -> Option<String> {
        self.handle.get().map(|store| store.revision_id())
    }

    /// Copy of the in-memory index
    pub fn index_snapshot(&self) -> GcdsResult<ContactIndex> {
        self.read_index(ContactIndex::clone)
    }

    // ------------------------------------------------------------------
    // Store and index lifecycle
    // ------------------------------------------------------------------

    /// Acquire the store and load (or create) the index snapshot
    pub async fn open(&self) -> GcdsResult<()> {
        self.datastore().await.map(|_| ())
    }

    async fn datastore(&self) -> GcdsResult<&Arc<dyn BackingStore>> {
        self.handle.acquire(|store| self.load_index(store)).await
    }

    /// Adopt the stored snapshot, or create and persist an empty index.
    async fn load_index(&self, store: Arc<dyn BackingStore>) -> GcdsResult<()> {
        let record = self.config.index_record_id;
        let record_str = record.to_string();

        let index = match store.get(record).await? {
            Some(value) => {
                let index: ContactIndex = serde_json::from_value(value)?;
                log_event(Event::IndexLoaded, &[("record", &record_str)]);
                index
            }
            None => {
                let index = ContactIndex::new();
                store.put(serde_json::to_value(&index)?, record).await?;
                log_event(Event::IndexCreated, &[("record", &record_str)]);
                index
            }
        };

        self.replace_index(index)?;
        self.dirty.store(false, Ordering::SeqCst);
        log_event(Event::DatastoreOpened, &[("datastore", self.handle.name())]);
        Ok(())
    }

    fn read_index<T>(&self, f: impl FnOnce(&ContactIndex) -> T) -> GcdsResult<T> {
        let guard = self
            .index
            .read()
            .map_err(|_| GcdsError::Internal("index lock poisoned".into()))?;
        let index = guard.as_ref().ok_or(GcdsError::IndexNotAvailable)?;
        Ok(f(index))
    }

    /// Mutate the index and mark it dirty
    fn write_index<T>(&self, f: impl FnOnce(&mut ContactIndex) -> T) -> GcdsResult<T> {
        let mut guard = self
            .index
            .write()
            .map_err(|_| GcdsError::Internal("index lock poisoned".into()))?;
        let index = guard.as_mut().ok_or(GcdsError::IndexNotAvailable)?;
        let out = f(index);
        self.dirty.store(true, Ordering::SeqCst);
        Ok(out)
    }

    fn replace_index(&self, index: ContactIndex) -> GcdsResult<()> {
        let mut guard = self
            .index
            .write()
            .map_err(|_| GcdsError::Internal("index lock poisoned".into()))?;
        *guard = Some(index);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Add
    // ------------------------------------------------------------------

    /// Integrate one origin contact, merging it into an existing merged
    /// contact when the matcher finds a duplicate.
    pub async fn add(&self, origin: &OriginStore, uid: &str, contact: &Contact) -> GcdsResult<MergedContactId> {
        let store = self.datastore().await?;
        let entry = OriginReference::new(uid, origin.owner.as_str());

        match self.matcher.find_match(contact, MatchMode::Passive, self).await? {
            MatchOutcome::Match(results) if !results.is_empty() => {
                self.do_append(&**store, entry, results[0].merged_id, contact).await
            }
            _ => self.do_add(&**store, entry, contact).await,
        }
    }

    async fn do_add(&self, store: &dyn BackingStore, entry: OriginReference, contact: &Contact) -> GcdsResult<MergedContactId> {
        let record = store.add(serde_json::to_value([&entry])?).await?;
        let id = MergedContactId::new(record);

        self.write_index(|index| {
            index.index_contact(contact, &entry.origin, &entry.uid, id, self.normalizer.as_ref())
        })?;

        log_event(
            Event::ContactIndexed,
            &[("merged_id", &id.to_string()), ("owner", &entry.origin), ("uid", &entry.uid)],
        );
        Ok(id)
    }

    async fn do_append(
        &self,
        store: &dyn BackingStore,
        entry: OriginReference,
        id: MergedContactId,
        contact: &Contact,
    ) -> GcdsResult<MergedContactId> {
        let mut entries = match store.get(id.record_id()).await? {
            Some(value) => parse_entries(id, value)?,
            None => Vec::new(),
        };
        entries.push(entry.clone());

        store.put(serde_json::to_value(&entries)?, id.record_id()).await?;

        self.write_index(|index| {
            index.index_contact(contact, &entry.origin, &entry.uid, id, self.normalizer.as_ref())
        })?;

        log_event(
            Event::ContactMerged,
            &[
                ("merged_id", &id.to_string()),
                ("owner", &entry.origin),
                ("uid", &entry.uid),
                ("entries", &entries.len().to_string()),
            ],
        );
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Remove / clear
    // ------------------------------------------------------------------

    /// Remove one origin contribution.
    ///
    /// With a `contact` payload the entries derived from its fields are
    /// removed. Without one, the configured `RemovalPolicy` applies. Under
    /// `Precise` no entry of the contribution survives either way.
    pub async fn remove(&self, origin: &OriginStore, uid: &str, contact: Option<&Contact>) -> GcdsResult<()> {
        let store = self.datastore().await?;
        let owner = origin.owner.as_str();

        let id = self.read_index(|index| index.resolve(owner, uid))??;
        let record = id.record_id();

        let value = store.get(record).await?.ok_or(GcdsError::CorruptEntry { id })?;
        let mut entries = parse_entries(id, value)?;

        if let Some(position) = entries.iter().position(|e| e.is(owner, uid)) {
            entries.remove(position);
        }

        if entries.is_empty() {
            store.remove(record).await?;
        } else {
            store.put(serde_json::to_value(&entries)?, record).await?;
        }

        let policy = self.config.removal_policy;
        let normalizer = self.normalizer.as_ref();
        self.write_index(|index| {
            match (contact, policy) {
                (Some(contact), RemovalPolicy::Precise) => {
                    index.unindex_contact(contact, owner, uid, id, normalizer);
                    index.strip_contribution(id, owner, uid);
                }
                (Some(contact), RemovalPolicy::OwnerWide) => {
                    index.unindex_contact(contact, owner, uid, id, normalizer);
                }
                (None, RemovalPolicy::Precise) => {
                    index.strip_contribution(id, owner, uid);
                }
                (None, RemovalPolicy::OwnerWide) => {
                    index.strip_owner(owner);
                }
            }
            index.remove_store_mapping(owner, uid);
        })?;

        let id_str = id.to_string();
        log_event(Event::ContactRemoved, &[("merged_id", &id_str), ("owner", owner), ("uid", uid)]);
        if entries.is_empty() {
            log_event(Event::EntryDeleted, &[("merged_id", &id_str)]);
        }
        Ok(())
    }

    /// Remove every origin contact of `origin`, or wipe the whole store
    /// and index when `origin` is `None`.
    pub async fn clear(&self, origin: Option<&OriginStore>) -> GcdsResult<()> {
        let store = self.datastore().await?;
        self.read_index(|_| ())?;

        let Some(origin) = origin else {
            store.clear().await?;
            self.replace_index(ContactIndex::new())?;
            self.dirty.store(true, Ordering::SeqCst);
            log_event(Event::StoreCleared, &[]);
            self.flush().await?;
            return Ok(());
        };

        let uids: Vec<String> = self
            .read_index(|index| {
                index
                    .store_bucket(&origin.owner)
                    .map(|bucket| bucket.keys().cloned().collect::<Vec<_>>())
            })?
            .ok_or_else(|| GcdsError::DatastoreNotFound { owner: origin.owner.clone() })?;

        for uid in &uids {
            self.remove(origin, uid, None).await?;
        }

        log_event(
            Event::OwnerCleared,
            &[("owner", &origin.owner), ("removed", &uids.len().to_string())],
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Merged contacts filed under `value` for `kind`, in first-seen order.
    /// A blank value returns nothing without touching the store.
    pub async fn find_by(&self, kind: LookupKind, value: &str) -> GcdsResult<Vec<MergedContact>> {
        if value.trim().is_empty() {
            return Ok(Vec::new());
        }

        let store = self.datastore().await?;
        let ids = self.read_index(|index| self.matching_ids(index, kind, value))?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.contact_data(&**store, &ids).await
    }

    /// `find_by` over a field name; unknown or blank fields find nothing.
    pub async fn find_by_field(&self, field: &str, value: &str) -> GcdsResult<Vec<MergedContact>> {
        if field.trim().is_empty() || value.trim().is_empty() {
            return Ok(Vec::new());
        }
        match field.parse::<LookupKind>() {
            Ok(kind) => self.find_by(kind, value).await,
            Err(_) => Ok(Vec::new()),
        }
    }

    pub async fn find(&self, options: &FindOptions) -> GcdsResult<Vec<MergedContact>> {
        match options.filter_by.first() {
            Some(field) => self.find_by_field(field, &options.filter_value).await,
            None => Ok(Vec::new()),
        }
    }

    fn matching_ids(&self, index: &ContactIndex, kind: LookupKind, value: &str) -> Vec<MergedContactId> {
        let mut refs: Vec<&IndexEntryRef> = Vec::new();
        match kind {
            LookupKind::Tel => {
                for variant in self.normalizer.phone_variants(value) {
                    for entry in index.lookup(kind, &variant) {
                        if !refs.contains(&entry) {
                            refs.push(entry);
                        }
                    }
                }
            }
            LookupKind::Email => refs.extend(index.lookup(kind, value)),
            LookupKind::Name | LookupKind::GivenName | LookupKind::FamilyName => {
                let key = self.normalizer.normalize_name(value);
                refs.extend(index.lookup(kind, &key));
            }
        }

        let mut ids = Vec::new();
        for entry in refs {
            if !ids.contains(&entry.id) {
                ids.push(entry.id);
            }
        }
        ids
    }

    async fn contact_data(&self, store: &dyn BackingStore, ids: &[MergedContactId]) -> GcdsResult<Vec<MergedContact>> {
        let records: Vec<RecordId> = ids.iter().map(MergedContactId::record_id).collect();
        let values = store.get_many(&records).await?;

        let mut pending = Vec::with_capacity(ids.len());
        for (id, value) in ids.iter().zip(values) {
            match value {
                Some(value) => pending.push(self.assembler.assemble(*id, parse_entries(*id, value)?)),
                None => log_event(Event::StaleIndexEntry, &[("merged_id", &id.to_string())]),
            }
        }

        try_join_all(pending).await
    }

    /// Origin references of one merged contact
    pub async fn get_entry(&self, id: MergedContactId) -> GcdsResult<Option<Vec<OriginReference>>> {
        let store = self.datastore().await?;
        match store.get(id.record_id()).await? {
            Some(value) => Ok(Some(parse_entries(id, value)?)),
            None => Ok(None),
        }
    }

    /// Assembled data of one merged contact
    pub async fn get_data(&self, id: MergedContactId) -> GcdsResult<Option<MergedContact>> {
        match self.get_entry(id).await? {
            Some(entries) => Ok(Some(self.assembler.assemble(id, entries).await?)),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Flush
    // ------------------------------------------------------------------

    /// Persist the index snapshot if it changed since the last flush.
    ///
    /// Returns `Ok(true)` if a snapshot was written. Fails with `NoStore`
    /// only when there is no datastore capability at all.
    pub async fn flush(&self) -> GcdsResult<bool> {
        if !self.handle.is_enabled() {
            return Err(GcdsError::NoStore);
        }

        let Some(store) = self.handle.get() else {
            log_event(Event::FlushSkipped, &[("reason", "not_loaded")]);
            return Ok(false);
        };

        if !self.dirty.swap(false, Ordering::SeqCst) {
            log_event(Event::FlushSkipped, &[("reason", "clean")]);
            return Ok(false);
        }

        let written = async {
            let snapshot = self.read_index(|index| serde_json::to_value(index))??;
            store.put(snapshot, self.config.index_record_id).await
        }
        .await;

        if let Err(e) = written {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(e);
        }

        log_event(Event::IndexFlushed, &[("revision", &store.revision_id())]);
        Ok(true)
    }
}

impl ContactDataProvider for GlobalContacts {
    fn lookup<'a>(&'a self, kind: LookupKind, value: &'a str) -> StoreFuture<'a, Vec<MergedContact>> {
        Box::pin(self.find_by(kind, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn manager() -> (Arc<MemoryStore>, GlobalContacts) {
        let store = Arc::new(MemoryStore::new());
        let gcds = GlobalContacts::with_store(store.clone());
        (store, gcds)
    }

    #[test]
    fn test_parse_entries_rejects_non_arrays() {
        let id = MergedContactId::new(4);
        assert!(matches!(parse_entries(id, json!({"uid": "a"})), Err(GcdsError::CorruptEntry { .. })));
        assert!(matches!(parse_entries(id, json!([1, 2])), Err(GcdsError::CorruptEntry { .. })));
        assert_eq!(
            parse_entries(id, json!([{"uid": "a", "origin": "X"}])).unwrap(),
            vec![OriginReference::new("a", "X")]
        );
    }

    #[tokio::test]
    async fn test_first_acquire_creates_snapshot() {
        let (store, gcds) = manager();

        assert!(gcds.find_by(LookupKind::Tel, "555").await.unwrap().is_empty());

        assert_eq!(store.writes(), 1);
        assert!(store.dump().contains_key(&1));
        assert!(!gcds.is_dirty());
        assert!(gcds.revision_id().is_some());
    }

    #[tokio::test]
    async fn test_existing_snapshot_is_adopted() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(json!({"byStore": {"X": {"a1": 2}}, "byTel": {"5551234": [{"id": 2, "owner": "X", "uid": "a1"}]}}), 1)
            .await
            .unwrap();
        store.put(json!([{"uid": "a1", "origin": "X"}]), 2).await.unwrap();
        let gcds = GlobalContacts::with_store(store.clone());

        let found = gcds.find_by(LookupKind::Tel, "555-1234").await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, MergedContactId::new(2));
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_unparsable_snapshot_fails_acquire() {
        let store = Arc::new(MemoryStore::new());
        store.put(json!("not an index"), 1).await.unwrap();
        let gcds = GlobalContacts::with_store(store);

        let err = gcds.find_by(LookupKind::Email, "a@b.c").await.unwrap_err();
        assert_eq!(err.code(), "GCDS_SERIALIZATION");
        assert_eq!(gcds.index_snapshot().unwrap_err().name(), "IndexNotAvailable");
    }

    #[tokio::test]
    async fn test_without_provider_everything_is_disabled() {
        let gcds = GlobalContacts::new(GcdsConfig::default(), None);

        let err = gcds.add(&OriginStore::new("X"), "a1", &Contact::new()).await.unwrap_err();
        assert_eq!(err.name(), "DatastoreNotEnabled");
        assert_eq!(gcds.flush().await.unwrap_err().name(), "NoStore");
        assert!(gcds.revision_id().is_none());
    }

    #[tokio::test]
    async fn test_flush_before_acquire_is_noop() {
        let (store, gcds) = manager();

        assert!(!gcds.flush().await.unwrap());
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_dirty() {
        let (store, gcds) = manager();
        gcds.add(&OriginStore::new("X"), "a1", &Contact::new().with_tel("555-1234"))
            .await
            .unwrap();

        store.fail_next_writes(1);
        assert!(gcds.flush().await.is_err());
        assert!(gcds.is_dirty());

        assert!(gcds.flush().await.unwrap());
        assert!(!gcds.is_dirty());
    }

    #[tokio::test]
    async fn test_find_adapter_uses_first_field() {
        let (_store, gcds) = manager();
        let id = gcds
            .add(&OriginStore::new("X"), "a1", &Contact::new().with_email("ana@example.com"))
            .await
            .unwrap();

        let found = gcds.find(&FindOptions::new("email", "ana@example.com")).await.unwrap();
        assert_eq!(found[0].id, id);

        assert!(gcds.find(&FindOptions::default()).await.unwrap().is_empty());
        assert!(gcds.find_by_field("org", "anything").await.unwrap().is_empty());
    }
}
