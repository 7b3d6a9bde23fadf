//! Global Contacts configuration
//!
//! All fields are optional in the JSON file; missing fields take defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::contact::RecordId;
use crate::errors::GcdsResult;

/// Name of the datastore holding merged contacts
pub const DEFAULT_DATASTORE_NAME: &str = "Global_Contacts_Datastore";

/// Well-known record id of the index snapshot
pub const DEFAULT_INDEX_RECORD_ID: RecordId = 1;

/// How `remove` cleans the lookup tables when no contact payload is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Strip only the entries of the removed origin contribution
    #[default]
    Precise,
    /// Strip every entry owned by the origin store
    OwnerWide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcdsConfig {
    #[serde(default = "default_datastore_name")]
    pub datastore_name: String,

    #[serde(default = "default_index_record_id")]
    pub index_record_id: RecordId,

    #[serde(default)]
    pub removal_policy: RemovalPolicy,

    /// Directory of file-backed stores (CLI only)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_datastore_name() -> String {
    DEFAULT_DATASTORE_NAME.to_string()
}

fn default_index_record_id() -> RecordId {
    DEFAULT_INDEX_RECORD_ID
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./gcds-data")
}

impl Default for GcdsConfig {
    fn default() -> Self {
        Self {
            datastore_name: default_datastore_name(),
            index_record_id: default_index_record_id(),
            removal_policy: RemovalPolicy::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl GcdsConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> GcdsResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_datastore_name(mut self, name: impl Into<String>) -> Self {
        self.datastore_name = name.into();
        self
    }

    pub fn with_index_record_id(mut self, id: RecordId) -> Self {
        self.index_record_id = id;
        self
    }

    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }
}
