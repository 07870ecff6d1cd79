//! # xsecdb-core
//!
//! The versioned curation engine for xsecdb - THE LOGIC.
//!
//! This crate implements the catalog substrate for particle-scattering
//! cross-section data: a content-addressed species hierarchy, a
//! deduplicated reaction store, versioned item and set records with a
//! draft/published/archived/retracted lifecycle, and a faceted search
//! engine over the published slice.
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Is deterministic: every table is a `BTreeMap`, every derived
//!   artifact is reproducible from the catalog value
//! - Takes timestamps as arguments; `Utc::now()` enters only through
//!   the `Curator` facade
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod curator;
pub mod formats;
pub mod item;
pub mod lifecycle;
pub mod primitives;
pub mod reaction;
pub mod search;
pub mod set;
pub mod species;
pub mod storage;
pub mod types;
pub mod views;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ItemKey, KeyedVersionInfo, OrganizationKey, OrphanedDraft, ReactionKey, RecordKind, RecordKey,
    ReferenceKey, Reversible, SetKey, SpeciesKey, Status, VersionInfo, XsecError,
};

// =============================================================================
// RE-EXPORTS: Curation Engine
// =============================================================================

pub use catalog::{Catalog, ItemRecord, SetRecord};
pub use curator::{Curator, StorageBackend};
pub use item::ItemSubmission;
pub use lifecycle::HistoryGraph;
pub use reaction::{
    CanonicalReaction, DataTable, ProcessInput, ReactionEntry, ReactionInput, ReactionNode,
    ReactionTypeTag, Reference, SubmissionDicts,
};
pub use search::{SearchFacets, SearchTemplate, SetFacetGroup, StateChoice};
pub use set::{SetProcess, SetSubmission};
pub use species::{
    CanonicalSpecies, ElectronicInput, ElectronicTerm, PathStep, SpeciesInput, SpeciesLevel,
    SpeciesNode, StateLeaf, StatePath, Vibrational, VibrationalInput,
};
pub use storage::RedbStore;
pub use views::{ItemView, ReactionView, SetView};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, catalog_from_bytes, catalog_to_bytes};
