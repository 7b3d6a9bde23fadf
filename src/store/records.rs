//! Record table shared by the store implementations

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::contact::RecordId;

/// All records of a store plus its id allocator and revision.
///
/// Ids handed out by `add` are strictly greater than every id ever
/// written, so a record put at a well-known id is never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Records {
    next_id: RecordId,
    revision: Uuid,
    records: BTreeMap<RecordId, Value>,
}

impl Default for Records {
    fn default() -> Self {
        Self {
            next_id: 1,
            revision: Uuid::new_v4(),
            records: BTreeMap::new(),
        }
    }
}

impl Records {
    pub(crate) fn get(&self, id: RecordId) -> Option<Value> {
        self.records.get(&id).cloned()
    }

    pub(crate) fn get_many(&self, ids: &[RecordId]) -> Vec<Option<Value>> {
        ids.iter().map(|id| self.get(*id)).collect()
    }

    pub(crate) fn add(&mut self, value: Value) -> RecordId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.records.insert(id, value);
        self.bump();
        id
    }

    pub(crate) fn put(&mut self, value: Value, id: RecordId) {
        self.next_id = self.next_id.max(id.saturating_add(1));
        self.records.insert(id, value);
        self.bump();
    }

    pub(crate) fn remove(&mut self, id: RecordId) {
        self.records.remove(&id);
        self.bump();
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.bump();
    }

    pub(crate) fn revision(&self) -> String {
        self.revision.to_string()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn ids(&self) -> Vec<RecordId> {
        self.records.keys().copied().collect()
    }

    fn bump(&mut self) {
        self.revision = Uuid::new_v4();
    }
}
