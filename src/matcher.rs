//! Duplicate matching
//!
//! A matcher decides whether an incoming origin contact is a duplicate of an
//! already merged contact. It searches through a `ContactDataProvider`,
//! which is the manager itself, so it sees the very indexes being built.

use serde::{Deserialize, Serialize};

use crate::assembly::MergedContact;
use crate::contact::{first_name_value, Contact, MergedContactId};
use crate::index::LookupKind;
use crate::store::StoreFuture;

/// Matching mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Automatic matching while importing; no user involved
    Passive,
    /// User-initiated matching; may be broader
    Active,
}

/// One merged contact the candidate matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub merged_id: MergedContactId,
    /// Field the match was found on
    pub matched_by: LookupKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Match(Vec<MatchResult>),
    Mismatch,
}

/// Lookup surface exposed to matchers
pub trait ContactDataProvider: Send + Sync {
    fn lookup<'a>(&'a self, kind: LookupKind, value: &'a str) -> StoreFuture<'a, Vec<MergedContact>>;
}

/// Finds merged contacts a candidate duplicates
pub trait ContactMatcher: Send + Sync {
    fn find_match<'a>(
        &'a self,
        contact: &'a Contact,
        mode: MatchMode,
        provider: &'a dyn ContactDataProvider,
    ) -> StoreFuture<'a, MatchOutcome>;
}

/// Matches on exact phone or email hits; `Active` mode also accepts an
/// exact folded-name hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl ExactMatcher {
    fn probes(contact: &Contact, mode: MatchMode) -> Vec<(LookupKind, String)> {
        let mut probes: Vec<(LookupKind, String)> = contact
            .tel
            .iter()
            .map(|t| (LookupKind::Tel, t.value.clone()))
            .chain(contact.email.iter().map(|e| (LookupKind::Email, e.value.clone())))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();

        if mode == MatchMode::Active {
            if let Some(name) = first_name_value(&contact.name) {
                probes.push((LookupKind::Name, name.to_string()));
            }
        }
        probes
    }
}

impl ContactMatcher for ExactMatcher {
    fn find_match<'a>(
        &'a self,
        contact: &'a Contact,
        mode: MatchMode,
        provider: &'a dyn ContactDataProvider,
    ) -> StoreFuture<'a, MatchOutcome> {
        Box::pin(async move {
            let mut results: Vec<MatchResult> = Vec::new();

            for (kind, value) in Self::probes(contact, mode) {
                for merged in provider.lookup(kind, &value).await? {
                    if !results.iter().any(|r| r.merged_id == merged.id) {
                        results.push(MatchResult {
                            merged_id: merged.id,
                            matched_by: kind,
                        });
                    }
                }
            }

            if results.is_empty() {
                Ok(MatchOutcome::Mismatch)
            } else {
                Ok(MatchOutcome::Match(results))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::OriginReference;
    use std::future::ready;

    /// Provider answering only for one key
    struct OneHit {
        kind: LookupKind,
        value: &'static str,
        id: u64,
    }

    impl ContactDataProvider for OneHit {
        fn lookup<'a>(&'a self, kind: LookupKind, value: &'a str) -> StoreFuture<'a, Vec<MergedContact>> {
            let hits = if kind == self.kind && value == self.value {
                vec![MergedContact {
                    id: MergedContactId::new(self.id),
                    entries: vec![OriginReference::new("a1", "X")],
                }]
            } else {
                Vec::new()
            };
            Box::pin(ready(Ok(hits)))
        }
    }

    #[tokio::test]
    async fn test_tel_hit_matches() {
        let provider = OneHit { kind: LookupKind::Tel, value: "555-1234", id: 2 };
        let contact = Contact::new().with_tel("555-1234");

        let outcome = ExactMatcher.find_match(&contact, MatchMode::Passive, &provider).await.unwrap();

        assert_eq!(
            outcome,
            MatchOutcome::Match(vec![MatchResult {
                merged_id: MergedContactId::new(2),
                matched_by: LookupKind::Tel,
            }])
        );
    }

    #[tokio::test]
    async fn test_name_only_counts_in_active_mode() {
        let provider = OneHit { kind: LookupKind::Name, value: "Ana", id: 5 };
        let contact = Contact::new().with_name("Ana");

        let passive = ExactMatcher.find_match(&contact, MatchMode::Passive, &provider).await.unwrap();
        let active = ExactMatcher.find_match(&contact, MatchMode::Active, &provider).await.unwrap();

        assert_eq!(passive, MatchOutcome::Mismatch);
        assert!(matches!(active, MatchOutcome::Match(ref r) if r[0].merged_id == MergedContactId::new(5)));
    }

    #[tokio::test]
    async fn test_blank_fields_are_not_probed() {
        let provider = OneHit { kind: LookupKind::Email, value: "", id: 9 };
        let contact = Contact::new().with_email("  ");

        let outcome = ExactMatcher.find_match(&contact, MatchMode::Passive, &provider).await.unwrap();
        assert_eq!(outcome, MatchOutcome::Mismatch);
    }
}
