//! # Faceted Search
//!
//! Search over the public slice of the catalog: published items that
//! belong to at least one published set. A search template holds one
//! selection per dimension (consumed states, produced states, type
//! tags, reversibility, sets); an empty selection contributes no
//! predicate for that dimension.
//!
//! State selections are paths through the species hierarchy. A path
//! that stops at a node matches that node and its descendants; a path
//! that ends with an omit step matches the node alone. Matching a side
//! of a reaction is count-aware: two selections of the same species
//! need either two entries or one entry with count two.
//!
//! Facet computation answers "what could I still add to my selection":
//! each dimension's options are recomputed from the matches of the
//! template with that one dimension unconstrained.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::reaction::ReactionTypeTag;
use crate::species::StatePath;
use crate::types::{ItemKey, Reversible, SetKey, SpeciesKey, Status};

// =============================================================================
// TEMPLATE
// =============================================================================

/// One selection per search dimension. Empty means unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SearchTemplate {
    pub consumes: Vec<StatePath>,
    pub produces: Vec<StatePath>,
    pub type_tags: Vec<ReactionTypeTag>,
    pub reversible: Reversible,
    pub sets: Vec<SetKey>,
}

/// Species-key groups for one side: one group per selected path, each
/// holding every key the path matches.
type SideGroups = Vec<BTreeSet<SpeciesKey>>;

struct ResolvedTemplate {
    consume_groups: SideGroups,
    produce_groups: SideGroups,
    type_tags: Vec<ReactionTypeTag>,
    reversible: Reversible,
    sets: Vec<SetKey>,
}

// =============================================================================
// FACET RESULTS
// =============================================================================

/// One node of a state facet tree, mirroring the species hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChoice {
    pub serialized: String,
    pub children: Vec<StateChoice>,
}

/// The published sets of one organization that still contain matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetFacetGroup {
    pub organization: String,
    pub sets: Vec<(SetKey, String)>,
}

/// Remaining options per dimension for the current template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFacets {
    pub consumes: Vec<StateChoice>,
    pub produces: Vec<StateChoice>,
    pub type_tags: Vec<ReactionTypeTag>,
    pub reversible: Vec<Reversible>,
    pub sets: Vec<SetFacetGroup>,
}

// =============================================================================
// SEARCH
// =============================================================================

impl Catalog {
    /// All items matching the template, in key order.
    #[must_use]
    pub fn search(&self, template: &SearchTemplate) -> Vec<ItemKey> {
        let resolved = self.resolve_template(template);
        self.visible_items()
            .into_iter()
            .filter(|item| self.matches(*item, &resolved))
            .collect()
    }

    /// Published items referenced by at least one published set.
    fn visible_items(&self) -> Vec<ItemKey> {
        self.items
            .iter()
            .filter(|(key, record)| {
                record.version.status == Status::Published
                    && !self
                        .containing_sets_with_status(**key, Status::Published)
                        .is_empty()
            })
            .map(|(key, _)| *key)
            .collect()
    }

    fn resolve_template(&self, template: &SearchTemplate) -> ResolvedTemplate {
        ResolvedTemplate {
            consume_groups: self.resolve_side(&template.consumes),
            produce_groups: self.resolve_side(&template.produces),
            type_tags: template.type_tags.clone(),
            reversible: template.reversible,
            sets: template.sets.clone(),
        }
    }

    /// Expand each path to the species keys it matches. An unknown
    /// summary yields an empty group, which no item can satisfy.
    fn resolve_side(&self, paths: &[StatePath]) -> SideGroups {
        paths
            .iter()
            .filter_map(StatePath::leaf)
            .map(|leaf| {
                let mut group = BTreeSet::new();
                let root = self
                    .species
                    .iter()
                    .find(|(_, node)| node.serialized == leaf.serialized)
                    .map(|(key, _)| *key);
                if let Some(root) = root {
                    group.insert(root);
                    if leaf.include_children {
                        group.extend(self.descendants(root));
                    }
                }
                group
            })
            .collect()
    }

    fn matches(&self, item: ItemKey, template: &ResolvedTemplate) -> bool {
        let Some(record) = self.items.get(&item) else {
            return false;
        };
        let Some(reaction) = self.reactions.get(&record.reaction) else {
            return false;
        };
        if !template.sets.is_empty() {
            let containing = self.containing_sets(item);
            if !template.sets.iter().any(|set| containing.contains(set)) {
                return false;
            }
        }
        if !template.type_tags.is_empty()
            && !template
                .type_tags
                .iter()
                .any(|tag| reaction.canonical.type_tags.contains(tag))
        {
            return false;
        }
        match template.reversible {
            Reversible::Both => {}
            Reversible::True => {
                if !reaction.canonical.reversible {
                    return false;
                }
            }
            Reversible::False => {
                if reaction.canonical.reversible {
                    return false;
                }
            }
        }
        side_satisfies(&reaction.canonical.consumes, &template.consume_groups)
            && side_satisfies(&reaction.canonical.produces, &template.produce_groups)
    }

    // ========================================================================
    // FACETS
    // ========================================================================

    /// Remaining options per dimension.
    ///
    /// Each dimension is recomputed against the matches of the
    /// template with that dimension unconstrained, so already-selected
    /// options stay visible and sibling options appear.
    #[must_use]
    pub fn search_facets(&self, template: &SearchTemplate) -> SearchFacets {
        let consumes = {
            let relaxed = SearchTemplate {
                consumes: vec![],
                ..template.clone()
            };
            self.state_choices(&self.search(&relaxed), Side::Consumes)
        };
        let produces = {
            let relaxed = SearchTemplate {
                produces: vec![],
                ..template.clone()
            };
            self.state_choices(&self.search(&relaxed), Side::Produces)
        };
        let type_tags = {
            let relaxed = SearchTemplate {
                type_tags: vec![],
                ..template.clone()
            };
            self.tag_choices(&self.search(&relaxed))
        };
        let reversible = {
            let relaxed = SearchTemplate {
                reversible: Reversible::Both,
                ..template.clone()
            };
            self.reversible_choices(&self.search(&relaxed))
        };
        let sets = {
            let relaxed = SearchTemplate {
                sets: vec![],
                ..template.clone()
            };
            self.set_choices(&self.search(&relaxed))
        };
        SearchFacets {
            consumes,
            produces,
            type_tags,
            reversible,
            sets,
        }
    }

    fn state_choices(&self, matches: &[ItemKey], side: Side) -> Vec<StateChoice> {
        let mut roots: Vec<StateChoice> = Vec::new();
        for item in matches {
            let Some(record) = self.items.get(item) else {
                continue;
            };
            let Some(reaction) = self.reactions.get(&record.reaction) else {
                continue;
            };
            let entries = match side {
                Side::Consumes => &reaction.canonical.consumes,
                Side::Produces => &reaction.canonical.produces,
            };
            for (species, _) in entries {
                insert_chain(&mut roots, self.ancestor_chain(*species));
            }
        }
        roots
    }

    /// Root-to-node summaries for a species node.
    fn ancestor_chain(&self, key: SpeciesKey) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cursor = Some(key);
        while let Some(node) = cursor {
            if let Some(record) = self.species.get(&node) {
                chain.push(record.serialized.clone());
            }
            cursor = self.substate_parent.get(&node).copied();
        }
        chain.reverse();
        chain
    }

    /// Tags present in the matches, first-seen order preserved.
    fn tag_choices(&self, matches: &[ItemKey]) -> Vec<ReactionTypeTag> {
        let mut tags: Vec<ReactionTypeTag> = Vec::new();
        for item in matches {
            let Some(record) = self.items.get(item) else {
                continue;
            };
            if let Some(reaction) = self.reactions.get(&record.reaction) {
                for tag in &reaction.canonical.type_tags {
                    if !tags.contains(tag) {
                        tags.push(*tag);
                    }
                }
            }
        }
        tags
    }

    fn reversible_choices(&self, matches: &[ItemKey]) -> Vec<Reversible> {
        let mut forward = false;
        let mut reverse = false;
        for item in matches {
            let Some(record) = self.items.get(item) else {
                continue;
            };
            if let Some(reaction) = self.reactions.get(&record.reaction) {
                if reaction.canonical.reversible {
                    reverse = true;
                } else {
                    forward = true;
                }
            }
        }
        let mut choices = Vec::new();
        if reverse {
            choices.push(Reversible::True);
        }
        if forward {
            choices.push(Reversible::False);
        }
        if forward && reverse {
            choices.push(Reversible::Both);
        }
        choices
    }

    fn set_choices(&self, matches: &[ItemKey]) -> Vec<SetFacetGroup> {
        let mut sets = BTreeSet::new();
        for item in matches {
            sets.extend(self.containing_sets_with_status(*item, Status::Published));
        }
        let mut groups: std::collections::BTreeMap<String, Vec<(SetKey, String)>> =
            std::collections::BTreeMap::new();
        for set in sets {
            let Some(record) = self.sets.get(&set) else {
                continue;
            };
            let organization = self
                .organization_name(record.contributor)
                .unwrap_or_default()
                .to_string();
            groups
                .entry(organization)
                .or_default()
                .push((set, record.name.clone()));
        }
        groups
            .into_iter()
            .map(|(organization, sets)| SetFacetGroup { organization, sets })
            .collect()
    }
}

enum Side {
    Consumes,
    Produces,
}

/// Merge one root-to-leaf chain into the choice forest, first-seen
/// order preserved.
fn insert_chain(forest: &mut Vec<StateChoice>, chain: Vec<String>) {
    let mut level = forest;
    for serialized in chain {
        let position = level.iter().position(|node| node.serialized == serialized);
        let index = match position {
            Some(index) => index,
            None => {
                level.push(StateChoice {
                    serialized,
                    children: vec![],
                });
                level.len() - 1
            }
        };
        level = &mut level[index].children;
    }
}

/// Count-aware matching of selection groups against one reaction side.
///
/// Every group must be covered by a distinct unit of stoichiometry:
/// an entry with count `n` can cover up to `n` groups.
fn side_satisfies(entries: &[(SpeciesKey, u32)], groups: &[BTreeSet<SpeciesKey>]) -> bool {
    let mut remaining: Vec<(SpeciesKey, u32)> = entries.to_vec();
    assign(&mut remaining, groups)
}

fn assign(remaining: &mut Vec<(SpeciesKey, u32)>, groups: &[BTreeSet<SpeciesKey>]) -> bool {
    let Some((group, rest)) = groups.split_first() else {
        return true;
    };
    for index in 0..remaining.len() {
        let (species, count) = remaining[index];
        if count == 0 || !group.contains(&species) {
            continue;
        }
        remaining[index].1 = count - 1;
        if assign(remaining, rest) {
            remaining[index].1 = count;
            return true;
        }
        remaining[index].1 = count;
    }
    false
}

// =============================================================================
// TESTS
// =============================================================================
