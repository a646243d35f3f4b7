//! In-memory certificate store keyed by `kid` / `x5t`

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

use super::Certificate;

/// Mapping from key identifier to signing certificate
///
/// A `None` entry records that the identifier was looked up after a refresh
/// and confirmed absent, so unknown identifiers do not trigger a remote
/// lookup on every validation within the same refresh window.
///
/// Entries are never removed; a successful refresh replaces the whole store.
#[derive(Debug, Default)]
pub struct CertificateStore {
    entries: DashMap<String, Option<Arc<Certificate>>>,
}

impl CertificateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a certificate unless the identifier is already taken
    ///
    /// Returns `true` if the certificate was inserted.
    pub fn insert(&self, key_id: &str, certificate: Arc<Certificate>) -> bool {
        match self.entries.entry(key_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Some(certificate));
                true
            }
        }
    }

    /// Record that `key_id` is confirmed absent
    ///
    /// The entry lock makes this safe against concurrent validators racing on
    /// the same unknown identifier; losing the race is not an error. Returns
    /// `true` if this call inserted the marker.
    pub fn mark_absent(&self, key_id: &str) -> bool {
        match self.entries.entry(key_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(None);
                true
            }
        }
    }

    /// Whether the identifier has an entry (a certificate or an absence marker)
    pub fn contains(&self, key_id: &str) -> bool {
        self.entries.contains_key(key_id)
    }

    /// Look up an identifier
    ///
    /// `None` means no entry; `Some(None)` means confirmed absent.
    pub fn get(&self, key_id: &str) -> Option<Option<Arc<Certificate>>> {
        self.entries.get(key_id).map(|entry| entry.value().clone())
    }

    /// The certificate for an identifier, if one is cached
    pub fn certificate(&self, key_id: &str) -> Option<Arc<Certificate>> {
        self.get(key_id).flatten()
    }

    /// Number of entries, absence markers included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all identifiers with their certificates, sorted by identifier
    pub fn entries(&self) -> Vec<(String, Option<Arc<Certificate>>)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
