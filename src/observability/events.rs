//! Observable events of the Global Contacts Data Store
//!
//! Events are explicit and typed. Each one is emitted as a `tracing` event
//! whose `event` field carries the upper-case name below.

use std::fmt;

use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Store lifecycle
    /// Backing store acquired
    DatastoreOpened,
    /// No snapshot found; an empty index was created and persisted
    IndexCreated,
    /// Index adopted from the stored snapshot
    IndexLoaded,

    // Mutations
    /// New merged entry created for an origin contact
    ContactIndexed,
    /// Origin contact appended to an existing merged entry
    ContactMerged,
    /// Origin contact removed from its merged entry
    ContactRemoved,
    /// Merged entry lost its last origin contact and was deleted
    EntryDeleted,
    /// Whole store wiped
    StoreCleared,
    /// Every origin contact of one store removed
    OwnerCleared,

    // Persistence
    /// Index snapshot written
    IndexFlushed,
    /// Flush requested with nothing to write
    FlushSkipped,

    // Anomalies
    /// Lookup entry points at a merged record that no longer exists
    StaleIndexEntry,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::DatastoreOpened => "DATASTORE_OPENED",
            Event::IndexCreated => "INDEX_CREATED",
            Event::IndexLoaded => "INDEX_LOADED",
            Event::ContactIndexed => "CONTACT_INDEXED",
            Event::ContactMerged => "CONTACT_MERGED",
            Event::ContactRemoved => "CONTACT_REMOVED",
            Event::EntryDeleted => "ENTRY_DELETED",
            Event::StoreCleared => "STORE_CLEARED",
            Event::OwnerCleared => "OWNER_CLEARED",
            Event::IndexFlushed => "INDEX_FLUSHED",
            Event::FlushSkipped => "FLUSH_SKIPPED",
            Event::StaleIndexEntry => "STALE_INDEX_ENTRY",
        }
    }

    /// Level the event is logged at
    pub fn level(&self) -> Level {
        match self {
            Event::StaleIndexEntry => Level::WARN,
            Event::FlushSkipped => Level::DEBUG,
            _ => Level::INFO,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
