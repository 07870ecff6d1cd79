//! # Catalog Arena
//!
//! The complete curated dataset as one serializable value: species
//! hierarchy, reaction store, reference and organization directories,
//! versioned item and set records, membership edges, and the two
//! history graphs. Every table is a `BTreeMap` so iteration order, and
//! therefore every derived artifact, is deterministic.
//!
//! Shared content (species, reactions, references, organizations) is
//! append-only and content-addressed: an upsert either returns the key
//! of an existing structurally-equal node or allocates a new one.
//! Mutation of versioned records lives in the `item` and `set`
//! modules; this module owns the storage primitives they build on.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::lifecycle::HistoryGraph;
use crate::primitives::MAX_HIERARCHY_DEPTH;
use crate::reaction::{
    CanonicalReaction, DataTable, ReactionInput, ReactionNode, Reference,
};
use crate::species::{CanonicalSpecies, SpeciesInput, SpeciesNode};
use crate::types::{
    ItemKey, OrganizationKey, ReactionKey, RecordKind, ReferenceKey, SetKey, SpeciesKey, Status,
    VersionInfo, XsecError,
};

// =============================================================================
// VERSIONED RECORDS
// =============================================================================

/// One curated process: a reaction, its dataset, and its provenance.
///
/// Immutable once published; drafts are edited by whole-record
/// replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub version: VersionInfo,
    pub contributor: OrganizationKey,
    pub reaction: ReactionKey,
    pub references: Vec<ReferenceKey>,
    pub data: DataTable,
    pub threshold: Option<f64>,
    #[serde(default)]
    pub comments: Vec<String>,
}

impl ItemRecord {
    /// Structural content equality, ignoring version metadata.
    ///
    /// Because shared content is deduplicated on insert, key equality
    /// on reaction and references is content equality.
    #[must_use]
    pub fn content_equal(&self, other: &ItemRecord) -> bool {
        self.contributor == other.contributor
            && self.reaction == other.reaction
            && self.references == other.references
            && self.data == other.data
            && self.threshold == other.threshold
            && self.comments == other.comments
    }
}

/// A named group of items published together by one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRecord {
    pub version: VersionInfo,
    pub contributor: OrganizationKey,
    pub name: String,
    pub description: String,
    /// Whether the contributor considers the set complete for plasma
    /// modelling.
    pub complete: bool,
}

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Catalog {
    // ---- species hierarchy ----
    pub(crate) species: BTreeMap<SpeciesKey, SpeciesNode>,
    pub(crate) species_index: BTreeMap<CanonicalSpecies, SpeciesKey>,
    pub(crate) substate_parent: BTreeMap<SpeciesKey, SpeciesKey>,
    pub(crate) substate_children: BTreeMap<SpeciesKey, BTreeSet<SpeciesKey>>,
    next_species: u64,

    // ---- reaction store ----
    pub(crate) reactions: BTreeMap<ReactionKey, ReactionNode>,
    pub(crate) reaction_index: BTreeMap<CanonicalReaction, ReactionKey>,
    next_reaction: u64,

    // ---- reference directory ----
    pub(crate) references: BTreeMap<ReferenceKey, Reference>,
    pub(crate) reference_index: BTreeMap<Reference, ReferenceKey>,
    next_reference: u64,

    // ---- organization directory ----
    pub(crate) organizations: BTreeMap<OrganizationKey, String>,
    pub(crate) organization_index: BTreeMap<String, OrganizationKey>,
    next_organization: u64,

    // ---- versioned records ----
    pub(crate) items: BTreeMap<ItemKey, ItemRecord>,
    pub(crate) sets: BTreeMap<SetKey, SetRecord>,
    next_item: u64,
    next_set: u64,

    // ---- membership edges, indexed both ways ----
    pub(crate) item_sets: BTreeMap<ItemKey, BTreeSet<SetKey>>,
    pub(crate) set_items: BTreeMap<SetKey, BTreeSet<ItemKey>>,

    // ---- version lineages ----
    pub(crate) item_history: HistoryGraph<ItemKey>,
    pub(crate) set_history: HistoryGraph<SetKey>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // SHARED-CONTENT UPSERTS
    // ========================================================================

    /// Upsert the full refinement chain of a species description,
    /// top-down with parent edges, returning the leaf's key.
    pub fn upsert_species_tree(&mut self, input: &SpeciesInput) -> Result<SpeciesKey, XsecError> {
        input.validate()?;
        let chain = input.expand();
        let mut parent: Option<SpeciesKey> = None;
        let mut leaf = SpeciesKey(0);
        for canonical in chain {
            let key = self.upsert_species_node(canonical);
            if let Some(parent_key) = parent {
                self.substate_parent.entry(key).or_insert(parent_key);
                self.substate_children
                    .entry(parent_key)
                    .or_default()
                    .insert(key);
            }
            parent = Some(key);
            leaf = key;
        }
        Ok(leaf)
    }

    fn upsert_species_node(&mut self, canonical: CanonicalSpecies) -> SpeciesKey {
        if let Some(existing) = self.species_index.get(&canonical) {
            return *existing;
        }
        let key = SpeciesKey(self.next_species);
        self.next_species += 1;
        self.species_index.insert(canonical.clone(), key);
        self.species.insert(key, SpeciesNode::from_canonical(canonical));
        key
    }

    /// Upsert a reaction by canonical content.
    pub fn upsert_reaction(&mut self, canonical: CanonicalReaction) -> ReactionKey {
        if let Some(existing) = self.reaction_index.get(&canonical) {
            return *existing;
        }
        let key = ReactionKey(self.next_reaction);
        self.next_reaction += 1;
        self.reaction_index.insert(canonical.clone(), key);
        self.reactions.insert(key, ReactionNode { canonical });
        key
    }

    /// Upsert a reference document by structural content.
    pub fn upsert_reference(&mut self, reference: Reference) -> ReferenceKey {
        if let Some(existing) = self.reference_index.get(&reference) {
            return *existing;
        }
        let key = ReferenceKey(self.next_reference);
        self.next_reference += 1;
        self.reference_index.insert(reference.clone(), key);
        self.references.insert(key, reference);
        key
    }

    /// Upsert an organization by name.
    pub fn upsert_organization(&mut self, name: &str) -> OrganizationKey {
        if let Some(existing) = self.organization_index.get(name) {
            return *existing;
        }
        let key = OrganizationKey(self.next_organization);
        self.next_organization += 1;
        self.organization_index.insert(name.to_string(), key);
        self.organizations.insert(key, name.to_string());
        key
    }

    /// Resolve a label-based reaction against a submission's state
    /// dictionary, upserting every referenced species chain, and
    /// upsert the canonical reaction.
    pub fn resolve_reaction(
        &mut self,
        input: &ReactionInput<String>,
        states: &BTreeMap<String, SpeciesInput>,
    ) -> Result<ReactionKey, XsecError> {
        input.validate()?;
        let mut resolve_side = |entries: &[crate::reaction::ReactionEntry<String>]| {
            let mut side = Vec::with_capacity(entries.len());
            for entry in entries {
                let species = states
                    .get(&entry.species)
                    .ok_or_else(|| XsecError::UnknownSpeciesLabel(entry.species.clone()))?;
                let key = self.upsert_species_tree(species)?;
                side.push((key, entry.count));
            }
            Ok::<_, XsecError>(side)
        };
        let consumes = resolve_side(&input.consumes)?;
        let produces = resolve_side(&input.produces)?;
        Ok(self.upsert_reaction(CanonicalReaction::new(
            consumes,
            produces,
            input.reversible,
            input.type_tags.clone(),
        )))
    }

    // ========================================================================
    // RECORD ALLOCATION AND ACCESS
    // ========================================================================

    pub(crate) fn alloc_item(&mut self, record: ItemRecord) -> ItemKey {
        let key = ItemKey(self.next_item);
        self.next_item += 1;
        self.items.insert(key, record);
        key
    }

    pub(crate) fn alloc_set(&mut self, record: SetRecord) -> SetKey {
        let key = SetKey(self.next_set);
        self.next_set += 1;
        self.sets.insert(key, record);
        key
    }

    pub(crate) fn item(&self, key: ItemKey) -> Result<&ItemRecord, XsecError> {
        self.items.get(&key).ok_or(XsecError::NotFound {
            kind: RecordKind::Item,
            key: key.0,
        })
    }

    pub(crate) fn item_mut(&mut self, key: ItemKey) -> Result<&mut ItemRecord, XsecError> {
        self.items.get_mut(&key).ok_or(XsecError::NotFound {
            kind: RecordKind::Item,
            key: key.0,
        })
    }

    pub(crate) fn set(&self, key: SetKey) -> Result<&SetRecord, XsecError> {
        self.sets.get(&key).ok_or(XsecError::NotFound {
            kind: RecordKind::Set,
            key: key.0,
        })
    }

    pub(crate) fn set_mut(&mut self, key: SetKey) -> Result<&mut SetRecord, XsecError> {
        self.sets.get_mut(&key).ok_or(XsecError::NotFound {
            kind: RecordKind::Set,
            key: key.0,
        })
    }

    // ========================================================================
    // MEMBERSHIP EDGES
    // ========================================================================

    pub(crate) fn link_member(&mut self, set: SetKey, item: ItemKey) {
        self.set_items.entry(set).or_default().insert(item);
        self.item_sets.entry(item).or_default().insert(set);
    }

    pub(crate) fn unlink_member(&mut self, set: SetKey, item: ItemKey) {
        if let Some(items) = self.set_items.get_mut(&set) {
            items.remove(&item);
            if items.is_empty() {
                self.set_items.remove(&set);
            }
        }
        if let Some(sets) = self.item_sets.get_mut(&item) {
            sets.remove(&set);
            if sets.is_empty() {
                self.item_sets.remove(&item);
            }
        }
    }

    /// Members of a set, in key order. Empty for an unknown set.
    #[must_use]
    pub fn members(&self, set: SetKey) -> Vec<ItemKey> {
        self.set_items
            .get(&set)
            .map(|items| items.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Sets an item belongs to, in key order.
    #[must_use]
    pub fn containing_sets(&self, item: ItemKey) -> Vec<SetKey> {
        self.item_sets
            .get(&item)
            .map(|sets| sets.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Sets an item belongs to whose record currently has `status`.
    pub(crate) fn containing_sets_with_status(&self, item: ItemKey, status: Status) -> Vec<SetKey> {
        self.containing_sets(item)
            .into_iter()
            .filter(|set| {
                self.sets
                    .get(set)
                    .is_some_and(|record| record.version.status == status)
            })
            .collect()
    }

    // ========================================================================
    // HIERARCHY TRAVERSAL
    // ========================================================================

    /// All strict descendants of a species node, in key order. Descent
    /// stops at the hierarchy depth, so a corrupted parent edge can
    /// never loop.
    #[must_use]
    pub fn descendants(&self, root: SpeciesKey) -> BTreeSet<SpeciesKey> {
        let mut out = BTreeSet::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if depth == MAX_HIERARCHY_DEPTH {
                continue;
            }
            if let Some(children) = self.substate_children.get(&node) {
                for child in children {
                    if out.insert(*child) {
                        stack.push((*child, depth + 1));
                    }
                }
            }
        }
        out
    }

    // ========================================================================
    // PUBLIC LOOKUPS
    // ========================================================================

    #[must_use]
    pub fn species_node(&self, key: SpeciesKey) -> Option<&SpeciesNode> {
        self.species.get(&key)
    }

    #[must_use]
    pub fn reaction_node(&self, key: ReactionKey) -> Option<&ReactionNode> {
        self.reactions.get(&key)
    }

    #[must_use]
    pub fn reference_doc(&self, key: ReferenceKey) -> Option<&Reference> {
        self.references.get(&key)
    }

    #[must_use]
    pub fn organization_name(&self, key: OrganizationKey) -> Option<&str> {
        self.organizations.get(&key).map(String::as_str)
    }

    /// Total record counts: (species, reactions, items, sets).
    #[must_use]
    pub fn stats(&self) -> (usize, usize, usize, usize) {
        (
            self.species.len(),
            self.reactions.len(),
            self.items.len(),
            self.sets.len(),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::{ElectronicInput, ElectronicTerm, Vibrational, VibrationalInput};

    fn n2_vibrational(v: u32) -> SpeciesInput {
        SpeciesInput {
            particle: "N2".to_string(),
            charge: 0,
            electronic: Some(ElectronicInput {
                term: ElectronicTerm::Unspecified("X".to_string()),
                vibrational: Some(VibrationalInput {
                    level: Vibrational::Single(v),
                    rotational: None,
                }),
            }),
        }
    }

    #[test]
    fn species_upsert_is_idempotent() {
        let mut catalog = Catalog::new();
        let first = catalog.upsert_species_tree(&n2_vibrational(1)).expect("upsert");
        let second = catalog.upsert_species_tree(&n2_vibrational(1)).expect("upsert");
        assert_eq!(first, second);
        // particle, electronic, vibrational
        assert_eq!(catalog.species.len(), 3);
    }

    #[test]
    fn sibling_levels_share_ancestors() {
        let mut catalog = Catalog::new();
        let v1 = catalog.upsert_species_tree(&n2_vibrational(1)).expect("upsert");
        let v2 = catalog.upsert_species_tree(&n2_vibrational(2)).expect("upsert");
        assert_ne!(v1, v2);
        assert_eq!(catalog.species.len(), 4);
        assert_eq!(catalog.substate_parent.get(&v1), catalog.substate_parent.get(&v2));
    }

    #[test]
    fn descendants_cover_all_levels() {
        let mut catalog = Catalog::new();
        catalog.upsert_species_tree(&n2_vibrational(1)).expect("upsert");
        catalog.upsert_species_tree(&n2_vibrational(2)).expect("upsert");
        let particle = catalog
            .species_index
            .get(&CanonicalSpecies {
                particle: "N2".to_string(),
                charge: 0,
                electronic: None,
                vibrational: None,
                rotational: None,
            })
            .copied()
            .expect("particle node exists");
        // electronic + two vibrational
        assert_eq!(catalog.descendants(particle).len(), 3);
    }

    #[test]
    fn descendant_walk_is_depth_bounded() {
        let mut catalog = Catalog::new();
        // A chain one level deeper than the hierarchy allows.
        for level in 0..=MAX_HIERARCHY_DEPTH as u64 {
            catalog
                .substate_children
                .entry(SpeciesKey(level))
                .or_default()
                .insert(SpeciesKey(level + 1));
        }
        let reached = catalog.descendants(SpeciesKey(0));
        assert_eq!(reached.len(), MAX_HIERARCHY_DEPTH);
        assert!(!reached.contains(&SpeciesKey(MAX_HIERARCHY_DEPTH as u64 + 1)));
    }

    #[test]
    fn reference_upsert_deduplicates() {
        let mut catalog = Catalog::new();
        let reference = Reference {
            title: "Cross sections for electron collisions".to_string(),
            authors: vec!["Y. Itikawa".to_string()],
            year: Some(2006),
            ..Reference::default()
        };
        let a = catalog.upsert_reference(reference.clone());
        let b = catalog.upsert_reference(reference);
        assert_eq!(a, b);
        assert_eq!(catalog.references.len(), 1);
    }

    #[test]
    fn organization_upsert_by_name() {
        let mut catalog = Catalog::new();
        let a = catalog.upsert_organization("Phelps group");
        let b = catalog.upsert_organization("Phelps group");
        let c = catalog.upsert_organization("Biagi group");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn resolve_reaction_rejects_unknown_label() {
        let mut catalog = Catalog::new();
        let input = ReactionInput {
            consumes: vec![crate::reaction::ReactionEntry {
                count: 1,
                species: "missing".to_string(),
            }],
            produces: vec![],
            reversible: false,
            type_tags: vec![],
        };
        let err = catalog
            .resolve_reaction(&input, &BTreeMap::new())
            .expect_err("label not in dict");
        assert!(matches!(err, XsecError::UnknownSpeciesLabel(label) if label == "missing"));
    }

    #[test]
    fn membership_edges_unlink_cleanly() {
        let mut catalog = Catalog::new();
        catalog.link_member(SetKey(1), ItemKey(10));
        catalog.link_member(SetKey(1), ItemKey(11));
        catalog.link_member(SetKey(2), ItemKey(10));
        assert_eq!(catalog.containing_sets(ItemKey(10)), vec![SetKey(1), SetKey(2)]);
        catalog.unlink_member(SetKey(1), ItemKey(10));
        assert_eq!(catalog.containing_sets(ItemKey(10)), vec![SetKey(2)]);
        assert_eq!(catalog.members(SetKey(1)), vec![ItemKey(11)]);
    }
}
