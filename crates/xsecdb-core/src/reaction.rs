//! # Reaction Store
//!
//! Content-addressed reactions. A reaction is a bag of consumed
//! species, a bag of produced species, a reversibility flag, and a
//! sorted list of type tags. Two submissions describing the same
//! reaction (in any entry order) resolve to the same stored node.

use serde::{Deserialize, Serialize};

use crate::species::SpeciesInput;
use crate::types::{SpeciesKey, XsecError};

// =============================================================================
// TYPE TAGS
// =============================================================================

/// Process classification tags carried by a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionTypeTag {
    Elastic,
    Effective,
    Excitation,
    Deexcitation,
    Ionization,
    Attachment,
    Recombination,
    Dissociation,
}

impl std::str::FromStr for ReactionTypeTag {
    type Err = XsecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "elastic" => Ok(Self::Elastic),
            "effective" => Ok(Self::Effective),
            "excitation" => Ok(Self::Excitation),
            "deexcitation" => Ok(Self::Deexcitation),
            "ionization" => Ok(Self::Ionization),
            "attachment" => Ok(Self::Attachment),
            "recombination" => Ok(Self::Recombination),
            "dissociation" => Ok(Self::Dissociation),
            other => Err(XsecError::InvalidSubmission(format!(
                "unknown reaction type tag '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for ReactionTypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Elastic => write!(f, "Elastic"),
            Self::Effective => write!(f, "Effective"),
            Self::Excitation => write!(f, "Excitation"),
            Self::Deexcitation => write!(f, "Deexcitation"),
            Self::Ionization => write!(f, "Ionization"),
            Self::Attachment => write!(f, "Attachment"),
            Self::Recombination => write!(f, "Recombination"),
            Self::Dissociation => write!(f, "Dissociation"),
        }
    }
}

// =============================================================================
// SUBMISSION-SIDE INPUT
// =============================================================================

/// One side entry of a reaction as submitted: a stoichiometric count
/// and a species reference. The reference type is generic so the same
/// shape serves submissions (local state labels) and resolved forms
/// (species keys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEntry<S> {
    pub count: u32,
    pub species: S,
}

/// A reaction as submitted, before species resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionInput<S> {
    pub consumes: Vec<ReactionEntry<S>>,
    pub produces: Vec<ReactionEntry<S>>,
    #[serde(default)]
    pub reversible: bool,
    #[serde(default)]
    pub type_tags: Vec<ReactionTypeTag>,
}

impl ReactionInput<String> {
    /// Validate structural limits before any storage mutation.
    pub fn validate(&self) -> Result<(), XsecError> {
        if self.consumes.is_empty() {
            return Err(XsecError::InvalidSubmission(
                "reaction consumes no species".to_string(),
            ));
        }
        for entry in self.consumes.iter().chain(self.produces.iter()) {
            if entry.count == 0 {
                return Err(XsecError::InvalidSubmission(
                    "reaction entry has zero count".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A full process submission for one item: reaction with local state
/// labels, the state dictionary mapping labels to species descriptions,
/// and the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInput {
    pub reaction: ReactionInput<String>,
    /// Local reference labels resolved against the submission's
    /// reference dictionary.
    #[serde(default)]
    pub references: Vec<String>,
    pub data: DataTable,
    /// Threshold energy in eV, if applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Free-form per-process comments carried through publication.
    #[serde(default)]
    pub comments: Vec<String>,
}

/// Tabulated cross-section data: column labels, units, and rows.
///
/// Values are stored and compared bitwise, never computed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub labels: Vec<String>,
    pub units: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// A bibliographic reference document. Content-addressed: structurally
/// equal references collapse onto one stored node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Reference {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A submission's maps from local labels to shared content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SubmissionDicts {
    /// Local state label -> species description.
    pub states: std::collections::BTreeMap<String, SpeciesInput>,
    /// Local reference label -> reference document.
    pub references: std::collections::BTreeMap<String, Reference>,
}

// =============================================================================
// STORED REACTION
// =============================================================================

/// The content-address key of a reaction: both sides sorted by species
/// key then count, tags sorted, plus the reversible flag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalReaction {
    pub consumes: Vec<(SpeciesKey, u32)>,
    pub produces: Vec<(SpeciesKey, u32)>,
    pub reversible: bool,
    pub type_tags: Vec<ReactionTypeTag>,
}

impl CanonicalReaction {
    /// Build the canonical form from resolved entries; sorts both
    /// sides and the tag list, and merges duplicate species entries.
    #[must_use]
    pub fn new(
        consumes: Vec<(SpeciesKey, u32)>,
        produces: Vec<(SpeciesKey, u32)>,
        reversible: bool,
        mut type_tags: Vec<ReactionTypeTag>,
    ) -> Self {
        type_tags.sort_unstable();
        type_tags.dedup();
        Self {
            consumes: merge_side(consumes),
            produces: merge_side(produces),
            reversible,
            type_tags,
        }
    }
}

fn merge_side(entries: Vec<(SpeciesKey, u32)>) -> Vec<(SpeciesKey, u32)> {
    let mut merged: std::collections::BTreeMap<SpeciesKey, u32> = std::collections::BTreeMap::new();
    for (species, count) in entries {
        *merged.entry(species).or_insert(0) += count;
    }
    merged.into_iter().collect()
}

/// A stored reaction node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionNode {
    pub canonical: CanonicalReaction,
}

impl ReactionNode {
    /// Render the reaction in arrow notation using the given resolver
    /// from species key to serialized summary.
    pub fn summary(&self, mut resolve: impl FnMut(SpeciesKey) -> String) -> String {
        let arrow = if self.canonical.reversible {
            "<->"
        } else {
            "->"
        };
        let side = |entries: &[(SpeciesKey, u32)], resolve: &mut dyn FnMut(SpeciesKey) -> String| {
            let parts: Vec<String> = entries
                .iter()
                .map(|(species, count)| {
                    let name = resolve(*species);
                    if *count == 1 {
                        name
                    } else {
                        format!("{count}{name}")
                    }
                })
                .collect();
            parts.join(" + ")
        };
        let lhs = side(&self.canonical.consumes, &mut resolve);
        let rhs = side(&self.canonical.produces, &mut resolve);
        format!("{lhs} {arrow} {rhs}")
    }
}

// =============================================================================
// TESTS
// =============================================================================
