//! Contact data model
//!
//! A merged record in the backing store is an ordered list of
//! `OriginReference`s, keyed by the `MergedContactId` the store assigned
//! when the record was created.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Record key in the backing store
pub type RecordId = u64;

/// Identifier of a merged contact, assigned by the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergedContactId(RecordId);

impl MergedContactId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }

    /// Returns the backing store record id
    pub fn record_id(&self) -> RecordId {
        self.0
    }
}

impl fmt::Display for MergedContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An origin address-book source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginStore {
    /// Owner of the origin datastore; unique per source
    pub owner: String,
}

impl OriginStore {
    pub fn new(owner: impl Into<String>) -> Self {
        Self { owner: owner.into() }
    }
}

/// One contact record inside one origin source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginReference {
    /// Contact id in the origin datastore
    pub uid: String,
    /// Owner of the origin datastore
    pub origin: String,
}

impl OriginReference {
    pub fn new(uid: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            origin: origin.into(),
        }
    }

    /// Returns true if this reference points at `uid` inside `owner`
    pub fn is(&self, owner: &str, uid: &str) -> bool {
        self.origin == owner && self.uid == uid
    }
}

/// A typed value such as a phone number or an email address
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactField {
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub value: String,
}

impl ContactField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            kinds: Vec::new(),
            value: value.into(),
        }
    }
}

/// Contact payload handed over by an origin source
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub given_name: Vec<String>,
    #[serde(default)]
    pub family_name: Vec<String>,
    #[serde(default)]
    pub tel: Vec<ContactField>,
    #[serde(default)]
    pub email: Vec<ContactField>,
}

impl Contact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name.push(name.into());
        self
    }

    pub fn with_given_name(mut self, name: impl Into<String>) -> Self {
        self.given_name.push(name.into());
        self
    }

    pub fn with_family_name(mut self, name: impl Into<String>) -> Self {
        self.family_name.push(name.into());
        self
    }

    pub fn with_tel(mut self, number: impl Into<String>) -> Self {
        self.tel.push(ContactField::new(number));
        self
    }

    pub fn with_email(mut self, address: impl Into<String>) -> Self {
        self.email.push(ContactField::new(address));
        self
    }
}

/// Returns the first element of a name field if it is not blank
pub(crate) fn first_name_value(values: &[String]) -> Option<&str> {
    values
        .first()
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contact_deserializes_camel_case() {
        let contact: Contact = serde_json::from_value(json!({
            "givenName": ["Ana"],
            "familyName": ["Pérez"],
            "tel": [{"type": ["mobile"], "value": "555-1234"}]
        }))
        .unwrap();

        assert_eq!(contact.given_name, vec!["Ana"]);
        assert_eq!(contact.family_name, vec!["Pérez"]);
        assert_eq!(contact.tel[0].value, "555-1234");
        assert_eq!(contact.tel[0].kinds, vec!["mobile"]);
        assert!(contact.email.is_empty());
    }

    #[test]
    fn test_origin_reference_layout() {
        let entry = OriginReference::new("a1", "X");
        assert_eq!(serde_json::to_value(&entry).unwrap(), json!({"uid": "a1", "origin": "X"}));
        assert!(entry.is("X", "a1"));
        assert!(!entry.is("Y", "a1"));
    }

    #[test]
    fn test_merged_id_is_transparent() {
        let id = MergedContactId::new(12);
        assert_eq!(serde_json::to_value(id).unwrap(), json!(12));
    }

    #[test]
    fn test_first_name_value_skips_blank() {
        assert_eq!(first_name_value(&["  ".to_string()]), None);
        assert_eq!(first_name_value(&[]), None);
        assert_eq!(first_name_value(&["Bo".to_string(), "X".to_string()]), Some("Bo"));
    }
}
