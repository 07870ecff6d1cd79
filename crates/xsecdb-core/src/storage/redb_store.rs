//! # redb-backed Catalog Storage
//!
//! A disk-backed catalog store using the redb embedded database,
//! providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! The catalog is persisted as one snapshot blob in the persistence
//! format. A mutation runs against a staged clone of the in-memory
//! catalog; the snapshot is written in one transaction and the clone
//! replaces the live catalog only after the commit succeeds. A failed
//! operation or a crash mid-commit leaves the previous snapshot
//! intact.

use std::path::Path;

use redb::{Database, ReadableDatabase, TableDefinition};

use crate::catalog::Catalog;
use crate::formats::{catalog_from_bytes, catalog_to_bytes};
use crate::types::XsecError;

/// Table for the catalog snapshot: fixed key -> serialized bytes.
const SNAPSHOT: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshot");

/// Key of the single snapshot row.
const SNAPSHOT_KEY: &str = "catalog";

/// A disk-backed catalog store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// The live catalog, loaded from the last committed snapshot.
    catalog: Catalog,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (species, reactions, items, sets) = self.catalog.stats();
        f.debug_struct("RedbStore")
            .field("species", &species)
            .field("reactions", &reactions)
            .field("items", &items)
            .field("sets", &sets)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a catalog database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, XsecError> {
        let db = Database::create(path.as_ref()).map_err(|e| XsecError::IoError(e.to_string()))?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| XsecError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(SNAPSHOT)
                .map_err(|e| XsecError::IoError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| XsecError::IoError(e.to_string()))?;
        }

        // Load the last committed snapshot
        let catalog = {
            let read_txn = db
                .begin_read()
                .map_err(|e| XsecError::IoError(e.to_string()))?;
            let table = read_txn
                .open_table(SNAPSHOT)
                .map_err(|e| XsecError::IoError(e.to_string()))?;
            let row = table
                .get(SNAPSHOT_KEY)
                .map_err(|e| XsecError::IoError(e.to_string()))?;
            match row {
                Some(bytes) => catalog_from_bytes(bytes.value())?,
                None => Catalog::new(),
            }
        };

        Ok(Self { db, catalog })
    }

    /// The live catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run a mutation atomically.
    ///
    /// The operation runs against a staged clone; the clone becomes
    /// the live catalog only after its snapshot has been committed to
    /// disk. The operation's error aborts the commit with the live
    /// catalog untouched.
    pub fn commit<T>(
        &mut self,
        op: impl FnOnce(&mut Catalog) -> Result<T, XsecError>,
    ) -> Result<T, XsecError> {
        let mut staged = self.catalog.clone();
        let out = op(&mut staged)?;

        let bytes = catalog_to_bytes(&staged)?;
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| XsecError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(SNAPSHOT)
                .map_err(|e| XsecError::IoError(e.to_string()))?;
            table
                .insert(SNAPSHOT_KEY, bytes.as_slice())
                .map_err(|e| XsecError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| XsecError::IoError(e.to_string()))?;

        self.catalog = staged;
        Ok(out)
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), XsecError> {
        self.db
            .compact()
            .map_err(|e| XsecError::IoError(e.to_string()))?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
