//! # Curator Facade
//!
//! The top-level handle applications use. A curator owns one storage
//! backend and routes every operation through it; write operations are
//! staged and applied atomically, so a failed operation never leaves a
//! half-mutated catalog, in memory or on disk.
//!
//! Timestamps are injected here so the catalog operations underneath
//! stay deterministic and testable.

use std::path::Path;

use chrono::Utc;

use crate::catalog::Catalog;
use crate::item::ItemSubmission;
use crate::search::{SearchFacets, SearchTemplate};
use crate::set::SetSubmission;
use crate::storage::RedbStore;
use crate::types::{ItemKey, KeyedVersionInfo, SetKey, XsecError};
use crate::views::{ItemView, SetView};

/// Storage backend for a curator.
#[derive(Debug)]
pub enum StorageBackend {
    /// Volatile catalog, gone when the curator is dropped.
    InMemory(Catalog),
    /// Disk-backed catalog with snapshot-per-commit durability.
    Persistent(RedbStore),
}

/// A handle over one catalog.
#[derive(Debug)]
pub struct Curator {
    backend: StorageBackend,
}

impl Curator {
    /// Create a curator over a fresh in-memory catalog.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            backend: StorageBackend::InMemory(Catalog::new()),
        }
    }

    /// Open (or create) a disk-backed curator.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, XsecError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// The live catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        match &self.backend {
            StorageBackend::InMemory(catalog) => catalog,
            StorageBackend::Persistent(store) => store.catalog(),
        }
    }

    /// Clone the live catalog for lock-free reading elsewhere.
    #[must_use]
    pub fn snapshot(&self) -> Catalog {
        self.catalog().clone()
    }

    /// Run a mutation atomically against the backend.
    fn commit<T>(
        &mut self,
        op: impl FnOnce(&mut Catalog) -> Result<T, XsecError>,
    ) -> Result<T, XsecError> {
        match &mut self.backend {
            StorageBackend::InMemory(catalog) => {
                let mut staged = catalog.clone();
                let out = op(&mut staged)?;
                *catalog = staged;
                Ok(out)
            }
            StorageBackend::Persistent(store) => store.commit(op),
        }
    }

    // ========================================================================
    // ITEM OPERATIONS
    // ========================================================================

    pub fn create_item(&mut self, submission: &ItemSubmission) -> Result<ItemKey, XsecError> {
        let now = Utc::now();
        self.commit(|catalog| catalog.create_item(submission, now))
    }

    pub fn update_item(
        &mut self,
        key: ItemKey,
        submission: &ItemSubmission,
    ) -> Result<ItemKey, XsecError> {
        let now = Utc::now();
        self.commit(|catalog| catalog.update_item(key, submission, now))
    }

    pub fn publish_item(&mut self, key: ItemKey) -> Result<(), XsecError> {
        self.commit(|catalog| catalog.publish_item(key))
    }

    pub fn delete_item(&mut self, key: ItemKey, message: Option<&str>) -> Result<(), XsecError> {
        self.commit(|catalog| catalog.delete_item(key, message))
    }

    pub fn item_history(&self, key: ItemKey) -> Result<Vec<KeyedVersionInfo<ItemKey>>, XsecError> {
        self.catalog().item_history(key)
    }

    pub fn item_view(&self, key: ItemKey) -> Result<ItemView, XsecError> {
        self.catalog().item_view(key)
    }

    // ========================================================================
    // SET OPERATIONS
    // ========================================================================

    pub fn create_set(&mut self, submission: &SetSubmission) -> Result<SetKey, XsecError> {
        let now = Utc::now();
        self.commit(|catalog| catalog.create_set(submission, now))
    }

    pub fn update_set(
        &mut self,
        key: SetKey,
        submission: &SetSubmission,
    ) -> Result<SetKey, XsecError> {
        let now = Utc::now();
        self.commit(|catalog| catalog.update_set(key, submission, now))
    }

    pub fn publish_set(&mut self, key: SetKey) -> Result<(), XsecError> {
        self.commit(|catalog| catalog.publish_set(key))
    }

    pub fn delete_set(&mut self, key: SetKey, message: Option<&str>) -> Result<(), XsecError> {
        self.commit(|catalog| catalog.delete_set(key, message))
    }

    pub fn set_history(&self, key: SetKey) -> Result<Vec<KeyedVersionInfo<SetKey>>, XsecError> {
        self.catalog().set_history(key)
    }

    pub fn set_view(&self, key: SetKey) -> Result<SetView, XsecError> {
        self.catalog().set_view(key)
    }

    // ========================================================================
    // SEARCH
    // ========================================================================

    #[must_use]
    pub fn search(&self, template: &SearchTemplate) -> Vec<ItemKey> {
        self.catalog().search(template)
    }

    #[must_use]
    pub fn search_facets(&self, template: &SearchTemplate) -> SearchFacets {
        self.catalog().search_facets(template)
    }
}

impl Default for Curator {
    fn default() -> Self {
        Self::in_memory()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::tests::elastic_submission;
    use crate::types::Status;

    #[test]
    fn in_memory_roundtrip() {
        let mut curator = Curator::in_memory();
        let key = curator
            .create_item(&elastic_submission("lab"))
            .expect("create");
        curator.publish_item(key).expect("publish");
        let view = curator.item_view(key).expect("view");
        assert_eq!(view.version.status, Status::Published);
    }

    #[test]
    fn failed_operation_rolls_back_in_memory() {
        let mut curator = Curator::in_memory();
        let key = curator
            .create_item(&elastic_submission("lab"))
            .expect("create");
        curator.publish_item(key).expect("publish");
        // Retract without a message fails and must not change anything.
        assert!(curator.delete_item(key, None).is_err());
        assert_eq!(
            curator.item_view(key).expect("view").version.status,
            Status::Published
        );
    }

    #[test]
    fn persistent_curator_reloads_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("curator.redb");
        let key = {
            let mut curator = Curator::open(&path).expect("open");
            let key = curator
                .create_item(&elastic_submission("lab"))
                .expect("create");
            curator.publish_item(key).expect("publish");
            key
        };
        let curator = Curator::open(&path).expect("reopen");
        assert_eq!(
            curator.item_view(key).expect("view").version.status,
            Status::Published
        );
    }
}
