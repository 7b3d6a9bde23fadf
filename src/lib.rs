//! globalcontacts - a merged contact index over a key-value datastore
//!
//! Origin contacts from many address books are matched against each other
//! and filed under merged contact ids. Five lookup tables (tel, email,
//! name, given name, family name) plus a per-origin reverse map are kept in
//! memory and persisted as a snapshot record next to the merged entries.

pub mod assembly;
pub mod cli;
pub mod config;
pub mod contact;
pub mod errors;
pub mod index;
pub mod manager;
pub mod matcher;
pub mod normalize;
pub mod observability;
pub mod store;

pub use assembly::{ContactAssembler, EntryAssembler, MergedContact};
pub use config::{GcdsConfig, RemovalPolicy};
pub use contact::{Contact, ContactField, MergedContactId, OriginReference, OriginStore, RecordId};
pub use errors::{GcdsError, GcdsErrorCode, GcdsResult};
pub use index::{ContactIndex, LookupKind};
pub use manager::{FindOptions, GlobalContacts};
pub use matcher::{ContactDataProvider, ContactMatcher, ExactMatcher, MatchMode, MatchOutcome, MatchResult};
pub use normalize::{DefaultNormalizer, Normalizer};
pub use store::{BackingStore, DatastoreProvider, FileProvider, FileStore, MemoryStore, StaticProvider};
