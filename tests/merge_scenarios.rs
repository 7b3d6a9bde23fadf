//! Merge Scenario Tests
//!
//! End-to-end behavior of `GlobalContacts` over an in-memory store:
//! - Duplicates from different origin stores share one merged contact
//! - Removing the last contribution deletes the merged entry
//! - Lookups by every field resolve to merged contacts

use std::sync::Arc;

use globalcontacts::{
    Contact, GlobalContacts, LookupKind, MemoryStore, MergedContactId, OriginReference, OriginStore,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn manager() -> (Arc<MemoryStore>, GlobalContacts) {
    let store = Arc::new(MemoryStore::new());
    let gcds = GlobalContacts::with_store(store.clone());
    (store, gcds)
}

fn origin(owner: &str) -> OriginStore {
    OriginStore::new(owner)
}

// =============================================================================
// Add / Merge
// =============================================================================

/// A single contact gets a fresh merged id and is findable by phone.
#[tokio::test]
async fn test_new_contact_gets_merged_id() {
    let (store, gcds) = manager();
    let contact = Contact::new().with_tel("555-1234");

    let id = gcds.add(&origin("X"), "a", &contact).await.unwrap();

    assert_ne!(id, MergedContactId::new(1));
    let found = gcds.find_by(LookupKind::Tel, "555-1234").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);
    assert_eq!(found[0].entries, vec![OriginReference::new("a", "X")]);
    assert!(store.dump().contains_key(&id.record_id()));
}

/// A duplicate from another store joins the existing merged contact.
#[tokio::test]
async fn test_duplicate_is_merged() {
    let (_store, gcds) = manager();

    let first = gcds.add(&origin("X"), "a", &Contact::new().with_tel("555-1234")).await.unwrap();
    let second = gcds.add(&origin("Y"), "b", &Contact::new().with_tel("5551234")).await.unwrap();

    assert_eq!(first, second);

    let entry = gcds.get_entry(first).await.unwrap().unwrap();
    assert_eq!(entry, vec![OriginReference::new("a", "X"), OriginReference::new("b", "Y")]);

    let found = gcds.find_by(LookupKind::Tel, "555-1234").await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].contains("X", "a"));
    assert!(found[0].contains("Y", "b"));
}

/// Contacts without shared phone or email stay apart.
#[tokio::test]
async fn test_unrelated_contacts_stay_separate() {
    let (_store, gcds) = manager();

    let a = gcds.add(&origin("X"), "a", &Contact::new().with_name("Ana").with_tel("111111")).await.unwrap();
    let b = gcds.add(&origin("Y"), "b", &Contact::new().with_name("Ana").with_tel("222222")).await.unwrap();

    assert_ne!(a, b);
    let by_name = gcds.find_by(LookupKind::Name, "ana").await.unwrap();
    let ids: Vec<_> = by_name.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![a, b]);
}

/// Name lookups fold case and diacritics.
#[tokio::test]
async fn test_name_lookups_are_folded() {
    let (_store, gcds) = manager();
    let contact = Contact::new()
        .with_name("José Pérez")
        .with_given_name("José")
        .with_family_name("Pérez");

    let id = gcds.add(&origin("X"), "a", &contact).await.unwrap();

    assert_eq!(gcds.find_by(LookupKind::Name, "jose perez").await.unwrap()[0].id, id);
    assert_eq!(gcds.find_by(LookupKind::GivenName, "JOSE").await.unwrap()[0].id, id);
    assert_eq!(gcds.find_by_field("familyName", "perez").await.unwrap()[0].id, id);
}

/// Email duplicates merge as well.
#[tokio::test]
async fn test_email_duplicate_is_merged() {
    let (_store, gcds) = manager();

    let a = gcds.add(&origin("X"), "a", &Contact::new().with_email("ana@example.com")).await.unwrap();
    let b = gcds.add(&origin("Y"), "b", &Contact::new().with_email("ana@example.com")).await.unwrap();

    assert_eq!(a, b);
    assert_eq!(gcds.find_by(LookupKind::Email, "ana@example.com").await.unwrap().len(), 1);
}

// =============================================================================
// Remove
// =============================================================================

/// Removing one of two contributions keeps the merged contact.
#[tokio::test]
async fn test_remove_one_of_two_keeps_entry() {
    let (_store, gcds) = manager();
    let id = gcds.add(&origin("X"), "a", &Contact::new().with_tel("555-1234")).await.unwrap();
    gcds.add(&origin("Y"), "b", &Contact::new().with_tel("555-1234")).await.unwrap();

    gcds.remove(&origin("X"), "a", None).await.unwrap();

    let entry = gcds.get_entry(id).await.unwrap().unwrap();
    assert_eq!(entry, vec![OriginReference::new("b", "Y")]);

    let found = gcds.find_by(LookupKind::Tel, "555-1234").await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(!found[0].contains("X", "a"));
    assert!(gcds.index_snapshot().unwrap().store_bucket("X").is_none());
}

/// Removing the last contribution deletes the merged entry record.
#[tokio::test]
async fn test_remove_last_deletes_entry() {
    let (store, gcds) = manager();
    let id = gcds.add(&origin("X"), "a", &Contact::new().with_tel("555-1234")).await.unwrap();

    gcds.remove(&origin("X"), "a", None).await.unwrap();

    assert!(gcds.get_entry(id).await.unwrap().is_none());
    assert!(!store.dump().contains_key(&id.record_id()));
    assert!(gcds.find_by(LookupKind::Tel, "555-1234").await.unwrap().is_empty());
    assert_eq!(gcds.index_snapshot().unwrap().references_to(id), 0);
}

/// A payload removes exactly the entries derived from its fields.
#[tokio::test]
async fn test_remove_with_payload() {
    let (_store, gcds) = manager();
    let contact = Contact::new().with_tel("555-1234").with_email("ana@example.com");
    let id = gcds.add(&origin("X"), "a", &contact).await.unwrap();

    gcds.remove(&origin("X"), "a", Some(&contact)).await.unwrap();

    let index = gcds.index_snapshot().unwrap();
    assert_eq!(index.references_to(id), 0);
    assert!(index.is_empty());
}

/// Unknown origin stores and unknown contacts are reported distinctly.
#[tokio::test]
async fn test_remove_unknown() {
    let (_store, gcds) = manager();
    gcds.add(&origin("X"), "a", &Contact::new().with_tel("555-1234")).await.unwrap();

    let err = gcds.remove(&origin("Z"), "a", None).await.unwrap_err();
    assert_eq!(err.name(), "DatastoreNotFound");

    let err = gcds.remove(&origin("X"), "missing", None).await.unwrap_err();
    assert_eq!(err.name(), "NotFound");
}

// =============================================================================
// Clear
// =============================================================================

/// Clearing one origin store removes its contributions only.
#[tokio::test]
async fn test_clear_one_store() {
    let (_store, gcds) = manager();
    gcds.add(&origin("X"), "a", &Contact::new().with_tel("111111")).await.unwrap();
    gcds.add(&origin("X"), "b", &Contact::new().with_tel("222222")).await.unwrap();
    let kept = gcds.add(&origin("Y"), "c", &Contact::new().with_tel("333333")).await.unwrap();

    gcds.clear(Some(&origin("X"))).await.unwrap();

    let index = gcds.index_snapshot().unwrap();
    assert!(index.store_bucket("X").is_none());
    assert!(index.store_bucket("Y").is_some());
    assert!(gcds.find_by(LookupKind::Tel, "111111").await.unwrap().is_empty());
    assert_eq!(gcds.find_by(LookupKind::Tel, "333333").await.unwrap()[0].id, kept);
}

/// Clearing everything leaves only an empty snapshot behind.
#[tokio::test]
async fn test_clear_everything() {
    let (store, gcds) = manager();
    gcds.add(&origin("X"), "a", &Contact::new().with_tel("111111")).await.unwrap();
    gcds.add(&origin("Y"), "b", &Contact::new().with_tel("222222")).await.unwrap();

    gcds.clear(None).await.unwrap();

    assert!(gcds.index_snapshot().unwrap().is_empty());
    assert!(!gcds.is_dirty());
    let records = store.dump();
    assert_eq!(records.keys().copied().collect::<Vec<_>>(), vec![1]);
}

/// Clearing an unknown origin store fails.
#[tokio::test]
async fn test_clear_unknown_store() {
    let (_store, gcds) = manager();

    let err = gcds.clear(Some(&origin("nobody"))).await.unwrap_err();
    assert_eq!(err.code(), "GCDS_DATASTORE_NOT_FOUND");
}
