//! # Storage Backends
//!
//! Disk persistence for the catalog. The in-memory catalog is the
//! source of truth during a process lifetime; this module makes it
//! durable.

pub mod redb_store;

pub use redb_store::RedbStore;
