//! Lookup kinds
//!
//! Each kind is bound to exactly one lookup table of `ContactIndex`.

use std::fmt;
use std::str::FromStr;

/// Field a lookup is performed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Tel,
    Email,
    Name,
    GivenName,
    FamilyName,
}

impl LookupKind {
    pub const ALL: [LookupKind; 5] = [
        LookupKind::Tel,
        LookupKind::Email,
        LookupKind::Name,
        LookupKind::GivenName,
        LookupKind::FamilyName,
    ];

    /// Contact field name
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Tel => "tel",
            LookupKind::Email => "email",
            LookupKind::Name => "name",
            LookupKind::GivenName => "givenName",
            LookupKind::FamilyName => "familyName",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown lookup field: {}", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for LookupKind {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LookupKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}
