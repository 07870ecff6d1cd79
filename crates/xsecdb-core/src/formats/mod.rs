//! # Serialization Formats
//!
//! Pure byte-level transformations of catalog snapshots. File and
//! database I/O lives in the storage and app layers.

pub mod persistence;

pub use persistence::{catalog_from_bytes, catalog_to_bytes, PersistenceHeader};
