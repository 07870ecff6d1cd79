//! # Persistence Format
//!
//! Binary serialization for catalog snapshots.
//!
//! Format: Header (5 bytes) + postcard-serialized catalog data.
//! - 4 bytes: Magic ("XSEC")
//! - 1 byte: Version
//!
//! Size and header validation run before payload deserialization so
//! corrupted or oversized data never reaches the allocator.

use crate::catalog::Catalog;
use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_PERSISTENCE_PAYLOAD_SIZE};
use crate::types::XsecError;

/// Minimum valid snapshot size (header only).
const MIN_FILE_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all catalog data.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), XsecError> {
        if &self.magic != MAGIC_BYTES {
            return Err(XsecError::SerializationError(
                "invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(XsecError::SerializationError(format!(
                "unsupported format version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XsecError> {
        if bytes.len() < MIN_FILE_SIZE {
            return Err(XsecError::SerializationError(
                "header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a catalog to bytes (header + payload).
///
/// This is a pure transformation, no file I/O.
pub fn catalog_to_bytes(catalog: &Catalog) -> Result<Vec<u8>, XsecError> {
    let header = PersistenceHeader::new();
    let payload =
        postcard::to_stdvec(catalog).map_err(|e| XsecError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(MIN_FILE_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a catalog from bytes.
///
/// Validates minimum size, maximum size, and the header before the
/// payload is parsed.
pub fn catalog_from_bytes(bytes: &[u8]) -> Result<Catalog, XsecError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(XsecError::SerializationError(
            "data too short: minimum 5 bytes required".to_string(),
        ));
    }
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(XsecError::SerializationError(format!(
            "data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[MIN_FILE_SIZE..];
    postcard::from_bytes(payload)
        .map_err(|e| XsecError::SerializationError(format!("failed to deserialize catalog: {e}")))
}

// =============================================================================
// TESTS
// =============================================================================
