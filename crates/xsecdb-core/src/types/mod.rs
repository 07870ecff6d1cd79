//! # Core Type Definitions
//!
//! This module contains the identifier, lifecycle, and error types for
//! the xsecdb curation engine:
//! - Record identifiers (`SpeciesKey`, `ReactionKey`, `ItemKey`, ...)
//! - Lifecycle state (`Status`, `VersionInfo`)
//! - Search reversibility choice (`Reversible`)
//! - Error types (`XsecError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types implement `Ord` for deterministic ordering in
//! `BTreeMap`/`BTreeSet`. Key assignment is monotonic per table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// RECORD IDENTIFIERS
// =============================================================================

macro_rules! key_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

key_type! {
    /// Identifier of a species node in the state hierarchy.
    SpeciesKey
}
key_type! {
    /// Identifier of a content-addressed reaction node.
    ReactionKey
}
key_type! {
    /// Identifier of a content-addressed reference document.
    ReferenceKey
}
key_type! {
    /// Identifier of a contributing organization.
    OrganizationKey
}
key_type! {
    /// Identifier of a versioned item record (one curated reaction + dataset).
    ItemKey
}
key_type! {
    /// Identifier of a versioned set record (a named group of items).
    SetKey
}

/// Which versioned-record table a key belongs to.
///
/// Used by the generic lifecycle engine to report errors without
/// losing the record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Item,
    Set,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Item => write!(f, "item"),
            Self::Set => write!(f, "set"),
        }
    }
}

/// Keys that identify versioned records.
///
/// The lifecycle engine is generic over this trait so the draftless
/// check, version chain, and publish logic exist exactly once.
pub trait RecordKey: Copy + Ord {
    /// The record table this key belongs to.
    const KIND: RecordKind;

    /// The raw numeric value (for error reporting).
    fn raw(self) -> u64;
}

impl RecordKey for ItemKey {
    const KIND: RecordKind = RecordKind::Item;

    fn raw(self) -> u64 {
        self.0
    }
}

impl RecordKey for SetKey {
    const KIND: RecordKind = RecordKind::Set;

    fn raw(self) -> u64 {
        self.0
    }
}

// =============================================================================
// LIFECYCLE STATE
// =============================================================================

/// Lifecycle status of a versioned record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Editable, invisible to the public read path.
    Draft,
    /// The current public version of its lineage.
    Published,
    /// Superseded by a newer published version.
    Archived,
    /// Withdrawn by its owner; terminal.
    Retracted,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
            Self::Archived => write!(f, "archived"),
            Self::Retracted => write!(f, "retracted"),
        }
    }
}

/// Version metadata attached to every versioned record.
///
/// `version` is a decimal integer rendered as text; it increases by one
/// on every fork of the lineage and never changes while a draft is
/// edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub status: Status,
    pub version: String,
    pub created_on: DateTime<Utc>,
    /// Set on draft creation and carried to the published record.
    pub commit_message: Option<String>,
    /// Set when a published record is retracted.
    pub retract_message: Option<String>,
}

impl VersionInfo {
    /// Create version info for a new record.
    #[must_use]
    pub fn new(
        status: Status,
        version: impl Into<String>,
        created_on: DateTime<Utc>,
        commit_message: Option<String>,
    ) -> Self {
        Self {
            status,
            version: version.into(),
            created_on,
            commit_message,
            retract_message: None,
        }
    }
}

/// A version-info record annotated with the key it belongs to.
///
/// Returned by the history traversal, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedVersionInfo<K> {
    pub key: K,
    #[serde(flatten)]
    pub info: VersionInfo,
}

// =============================================================================
// SEARCH REVERSIBILITY CHOICE
// =============================================================================

/// Reversibility selection for the search template.
///
/// `Both` contributes no predicate; the other two filter on the
/// reaction's reversible flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Reversible {
    True,
    False,
    #[default]
    Both,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// One entry of a [`XsecError::PublishWouldOrphanDraft`] aggregate.
///
/// Publishing the set would archive `published`, stranding every set in
/// `other_sets` with an archived member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedDraft {
    /// The draft member of the set being published.
    pub draft: ItemKey,
    /// The published sibling of `draft` that publishing would archive.
    pub published: ItemKey,
    /// Sets outside the publishing set's own lineage that reference
    /// `published`.
    pub other_sets: Vec<SetKey>,
}

impl std::fmt::Display for OrphanedDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sets: Vec<String> = self.other_sets.iter().map(|s| s.to_string()).collect();
        write!(
            f,
            "draft item {} has published version {} in other sets ({})",
            self.draft,
            self.published,
            sets.join(",")
        )
    }
}

/// Errors surfaced by the xsecdb engine.
///
/// Every rejected lifecycle transition names the offending status; no
/// operation silently coerces an invalid transition. Only storage
/// failures (`IoError`) are considered fatal by callers.
#[derive(Debug, Error)]
pub enum XsecError {
    /// The record or lineage does not exist.
    #[error("{kind} {key} does not exist")]
    NotFound { kind: RecordKind, key: u64 },

    /// The operation is not legal for the record's current status.
    #[error("can not {operation} {kind} {key} with status {status}")]
    InvalidStatusTransition {
        kind: RecordKind,
        key: u64,
        status: Status,
        operation: &'static str,
    },

    /// The draftless invariant is violated; carries the existing draft.
    #[error("can not create draft of {kind} {key}, it already exists as {existing}")]
    DraftAlreadyExists {
        kind: RecordKind,
        key: u64,
        existing: u64,
    },

    /// Deleting the item is blocked by set membership.
    #[error("can not delete item {item} that belongs to set(s) {}", format_set_keys(.sets))]
    ReferencedByContainer { item: ItemKey, sets: Vec<SetKey> },

    /// Publishing the set would leave other sets referencing archived
    /// members. Aggregate: one entry per offending member.
    #[error("unable to publish: {}", format_orphans(.0))]
    PublishWouldOrphanDraft(Vec<OrphanedDraft>),

    /// A local species label in a submission has no entry in the
    /// submission's state table.
    #[error("unknown species label '{0}' in submission")]
    UnknownSpeciesLabel(String),

    /// A local reference label in a submission has no entry in the
    /// submission's reference table.
    #[error("unknown reference label '{0}' in submission")]
    UnknownReferenceLabel(String),

    /// Retracting a published record requires a non-empty message.
    #[error("retracting a published {0} requires a retract message")]
    MissingRetractMessage(RecordKind),

    /// The version string is not a decimal integer.
    #[error("invalid version string '{0}'")]
    InvalidVersion(String),

    /// A submission failed structural validation.
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// An underlying-store I/O error occurred. Fatal; not retried.
    #[error("I/O error: {0}")]
    IoError(String),
}

fn format_set_keys(sets: &[SetKey]) -> String {
    let keys: Vec<String> = sets.iter().map(|s| s.to_string()).collect();
    keys.join(",")
}

fn format_orphans(entries: &[OrphanedDraft]) -> String {
    let lines: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
    lines.join("; ")
}

/// Reject oversized commit and retract messages before they are
/// stored.
pub(crate) fn validate_message(message: &str) -> Result<(), XsecError> {
    if message.len() > crate::primitives::MAX_MESSAGE_LENGTH {
        return Err(XsecError::InvalidSubmission(format!(
            "message exceeds {} bytes",
            crate::primitives::MAX_MESSAGE_LENGTH
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
