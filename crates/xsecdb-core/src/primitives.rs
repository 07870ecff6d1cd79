//! # Innate Primitives
//!
//! Hardcoded runtime constants for the xsecdb engine.
//!
//! These values are compiled into the binary and are immutable at
//! runtime. Validation limits exist so that malformed or hostile
//! submissions are rejected before they touch the catalog.

/// Magic bytes for the xsecdb binary snapshot header.
///
/// - File Header = Magic Bytes ("XSEC") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"XSEC";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum allowed payload size for the snapshot format.
///
/// Validated BEFORE attempting deserialization to prevent
/// allocation-based memory exhaustion from corrupted files.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 500 * 1024 * 1024; // 500 MB

/// Depth of the species hierarchy below the particle level.
///
/// particle -> electronic -> vibrational -> rotational.
/// Hierarchy descent during search expansion is bounded by this.
pub const MAX_HIERARCHY_DEPTH: usize = 3;

/// Version string assigned to the first record of a new lineage.
pub const INITIAL_VERSION: &str = "1";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for particle names, state labels, and local ids.
pub const MAX_LABEL_LENGTH: usize = 256;

/// Maximum length for commit and retract messages.
pub const MAX_MESSAGE_LENGTH: usize = 65536;

/// Maximum number of member processes in a single set submission.
pub const MAX_SET_MEMBERS: usize = 10000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"XSEC");
    }

    #[test]
    fn hierarchy_depth_is_three() {
        // particle -> electronic -> vibrational -> rotational
        assert_eq!(MAX_HIERARCHY_DEPTH, 3);
    }
}
