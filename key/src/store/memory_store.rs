//! In-process key store
//!
//! Clones share one map, so a second manager built on a clone sees the same
//! material the way a second process would see a persistent store.

use crate::{
    store_results::{DeleteResult, ExistsResult, FetchResult, PendingResult, StoreResult},
    traits::KeyStorage,
};
use dashmap::DashMap;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Key store backed by a concurrent in-memory map
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    entries: Arc<DashMap<String, Zeroizing<Vec<u8>>>>,
}

impl MemoryKeyStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for MemoryKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKeyStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl KeyStorage for MemoryKeyStore {
    fn store(&self, identifier: &str, key_material: &[u8]) -> StoreResult {
        self.entries.insert(
            identifier.to_string(),
            Zeroizing::new(key_material.to_vec()),
        );
        PendingResult::ready("store", Ok(()))
    }

    fn fetch(&self, identifier: &str) -> FetchResult {
        let material = self.entries.get(identifier).map(|entry| entry.value().clone());
        PendingResult::ready("fetch", Ok(material))
    }

    fn delete(&self, identifier: &str) -> DeleteResult {
        self.entries.remove(identifier);
        PendingResult::ready("delete", Ok(()))
    }

    fn exists(&self, identifier: &str) -> ExistsResult {
        PendingResult::ready("exists", Ok(self.entries.contains_key(identifier)))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
