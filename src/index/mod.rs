//! Contact index subsystem
//!
//! The index is derived state: it mirrors the merged entries held in the
//! backing store and is persisted as one snapshot record on flush.
//!
//! # Design Principles
//!
//! - Derived state: merged entries are the source of truth
//! - Deterministic: BTreeMap iteration order, insertion-ordered buckets
//! - Typed dispatch: each `LookupKind` is bound to one table

mod bucket;
mod lookup;
mod tables;

pub use bucket::{IndexEntryRef, RefTable};
pub use lookup::{LookupKind, UnknownField};
pub use tables::{ContactIndex, StoreBucket};
