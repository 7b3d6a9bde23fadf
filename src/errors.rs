//! Error types for the Global Contacts Data Store
//!
//! Every variant carries a stable string code (`GCDS_*`) and the legacy
//! error name reported to origin address-book sources.

use thiserror::Error;

use crate::contact::MergedContactId;

/// Result type for Global Contacts operations
pub type GcdsResult<T> = Result<T, GcdsError>;

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcdsErrorCode {
    DatastoreNotEnabled,
    DatastoreNotFound,
    NotFound,
    IndexNotAvailable,
    NoStore,
    CorruptEntry,
    StoreFailure,
    MatcherFailure,
    Serialization,
    Io,
    Internal,
}

impl GcdsErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatastoreNotEnabled => "GCDS_DATASTORE_NOT_ENABLED",
            Self::DatastoreNotFound => "GCDS_DATASTORE_NOT_FOUND",
            Self::NotFound => "GCDS_NOT_FOUND",
            Self::IndexNotAvailable => "GCDS_INDEX_NOT_AVAILABLE",
            Self::NoStore => "GCDS_NO_STORE",
            Self::CorruptEntry => "GCDS_CORRUPT_ENTRY",
            Self::StoreFailure => "GCDS_STORE_FAILURE",
            Self::MatcherFailure => "GCDS_MATCHER_FAILURE",
            Self::Serialization => "GCDS_SERIALIZATION",
            Self::Io => "GCDS_IO",
            Self::Internal => "GCDS_INTERNAL",
        }
    }

    /// Returns the error name as seen by callers of the datastore API
    pub fn name(&self) -> &'static str {
        match self {
            Self::DatastoreNotEnabled => "DatastoreNotEnabled",
            Self::DatastoreNotFound => "DatastoreNotFound",
            Self::NotFound => "NotFound",
            Self::IndexNotAvailable => "IndexNotAvailable",
            Self::NoStore => "NoStore",
            Self::CorruptEntry => "CorruptEntry",
            Self::StoreFailure => "StoreFailure",
            Self::MatcherFailure => "MatcherFailure",
            Self::Serialization => "SerializationError",
            Self::Io => "IoError",
            Self::Internal => "InternalError",
        }
    }
}

/// Global Contacts errors
#[derive(Debug, Error)]
pub enum GcdsError {
    #[error("Datastore capability is not enabled")]
    DatastoreNotEnabled,

    #[error("No entries indexed for origin store: {owner}")]
    DatastoreNotFound { owner: String },

    #[error("Origin contact {uid} is not indexed for store {owner}")]
    NotFound { owner: String, uid: String },

    #[error("Index is not available")]
    IndexNotAvailable,

    #[error("No datastore present")]
    NoStore,

    #[error("Merged entry {id} is not a list of origin references")]
    CorruptEntry { id: MergedContactId },

    #[error("Backing store failure: {0}")]
    Store(String),

    #[error("Matcher failure: {0}")]
    Matcher(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GcdsError {
    /// Returns the error code for this error
    pub fn error_code(&self) -> GcdsErrorCode {
        match self {
            GcdsError::DatastoreNotEnabled => GcdsErrorCode::DatastoreNotEnabled,
            GcdsError::DatastoreNotFound { .. } => GcdsErrorCode::DatastoreNotFound,
            GcdsError::NotFound { .. } => GcdsErrorCode::NotFound,
            GcdsError::IndexNotAvailable => GcdsErrorCode::IndexNotAvailable,
            GcdsError::NoStore => GcdsErrorCode::NoStore,
            GcdsError::CorruptEntry { .. } => GcdsErrorCode::CorruptEntry,
            GcdsError::Store(_) => GcdsErrorCode::StoreFailure,
            GcdsError::Matcher(_) => GcdsErrorCode::MatcherFailure,
            GcdsError::Serialization(_) => GcdsErrorCode::Serialization,
            GcdsError::Io(_) => GcdsErrorCode::Io,
            GcdsError::Internal(_) => GcdsErrorCode::Internal,
        }
    }

    /// Shorthand for `error_code().code()`
    pub fn code(&self) -> &'static str {
        self.error_code().code()
    }

    /// Shorthand for `error_code().name()`
    pub fn name(&self) -> &'static str {
        self.error_code().name()
    }

    pub fn store(msg: impl Into<String>) -> Self {
        GcdsError::Store(msg.into())
    }

    pub fn matcher(msg: impl Into<String>) -> Self {
        GcdsError::Matcher(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_names() {
        assert_eq!(GcdsError::DatastoreNotEnabled.name(), "DatastoreNotEnabled");
        assert_eq!(
            GcdsError::DatastoreNotFound { owner: "x".into() }.name(),
            "DatastoreNotFound"
        );
        assert_eq!(
            GcdsError::NotFound { owner: "x".into(), uid: "1".into() }.name(),
            "NotFound"
        );
        assert_eq!(GcdsError::IndexNotAvailable.name(), "IndexNotAvailable");
    }

    #[test]
    fn test_codes() {
        assert_eq!(GcdsError::NoStore.code(), "GCDS_NO_STORE");
        assert_eq!(
            GcdsError::CorruptEntry { id: MergedContactId::new(7) }.code(),
            "GCDS_CORRUPT_ENTRY"
        );
        assert_eq!(GcdsError::store("disk full").code(), "GCDS_STORE_FAILURE");
    }

    #[test]
    fn test_display_includes_context() {
        let err = GcdsError::NotFound { owner: "sim".into(), uid: "42".into() };
        let display = format!("{}", err);
        assert!(display.contains("sim"));
        assert!(display.contains("42"));
    }
}
