//! # Species Hierarchy
//!
//! Chemical species and their excitation-level hierarchy. A species
//! node sits at one of four levels:
//! particle -> electronic -> vibrational -> rotational, each level
//! refining its parent. Nodes are content-addressed: structurally equal
//! descriptions map to one node regardless of submitter.
//!
//! Every node carries a human-readable serialized summary (for example
//! `N2{X,v=3}` or `Ar^+`) derived from its structural content. The
//! summary is what downstream views and the search facets display.

use serde::{Deserialize, Serialize};

use crate::types::XsecError;

// =============================================================================
// STRUCTURAL CONTENT
// =============================================================================

/// Electronic term descriptor.
///
/// The engine treats the term as opaque structured content; it only
/// needs equality, ordering, and a rendering. `Unspecified` carries a
/// free-form designation for species whose coupling scheme is not
/// modeled.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElectronicTerm {
    /// Free-form electronic designation, e.g. `X`, `A`, `*`.
    Unspecified(String),
    /// LS-coupled atomic term, e.g. `2P°` rendered from (s2+1, l, j2, parity).
    AtomLs {
        /// Twice the spin multiplicity minus one is avoided: this is 2S.
        double_spin: u32,
        /// Orbital angular momentum quantum number L.
        orbital: u32,
        /// Twice the total angular momentum J (half-integers allowed).
        double_total: u32,
        /// True for odd parity (rendered as a degree sign).
        odd_parity: bool,
    },
    /// Diatomic molecular term, e.g. `X 1Sg+`.
    Diatomic {
        /// Electronic state letter, e.g. `X`, `A`, `B`.
        state: String,
        /// 2S+1 spin multiplicity.
        multiplicity: u32,
        /// Projection of L on the internuclear axis (0 = Sigma).
        lambda: u32,
        /// Reflection symmetry for Sigma states, `+` or `-`.
        reflection: Option<char>,
        /// Inversion symmetry for homonuclear molecules, `g` or `u`.
        parity: Option<char>,
    },
    /// Linear triatomic term with an inversion center, e.g. `X 1Su+`
    /// for CO2. Vibrational refinement below it uses the (v1, v2, v3)
    /// triple.
    LinearTriatom {
        /// Electronic state letter.
        state: String,
        /// 2S+1 spin multiplicity.
        multiplicity: u32,
        /// Projection of L on the molecular axis (0 = Sigma).
        lambda: u32,
        /// Inversion symmetry, `g` or `u` (always present at the
        /// inversion center).
        parity: char,
        /// Reflection symmetry for Sigma states, `+` or `-`.
        reflection: Option<char>,
    },
}

impl ElectronicTerm {
    /// Render the term the way set exports and facets display it.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Unspecified(designation) => designation.clone(),
            Self::AtomLs {
                double_spin,
                orbital,
                double_total,
                odd_parity,
            } => {
                let l = orbital_letter(*orbital);
                let multiplicity = double_spin + 1;
                let j = render_half_integer(*double_total);
                let parity = if *odd_parity { "°" } else { "" };
                format!("{multiplicity}{l}{parity}_{j}")
            }
            Self::Diatomic {
                state,
                multiplicity,
                lambda,
                reflection,
                parity,
            } => {
                let lambda_letter = lambda_letter(*lambda);
                let mut term = format!("{state} {multiplicity}{lambda_letter}");
                if let Some(p) = parity {
                    term.push(*p);
                }
                if let Some(r) = reflection {
                    term.push(*r);
                }
                term
            }
            Self::LinearTriatom {
                state,
                multiplicity,
                lambda,
                parity,
                reflection,
            } => {
                let lambda_letter = lambda_letter(*lambda);
                let mut term = format!("{state} {multiplicity}{lambda_letter}{parity}");
                if let Some(r) = reflection {
                    term.push(*r);
                }
                term
            }
        }
    }
}

fn orbital_letter(l: u32) -> char {
    match l {
        0 => 'S',
        1 => 'P',
        2 => 'D',
        3 => 'F',
        4 => 'G',
        _ => 'H',
    }
}

fn lambda_letter(lambda: u32) -> char {
    match lambda {
        0 => 'S',
        1 => 'P',
        2 => 'D',
        _ => 'F',
    }
}

fn render_half_integer(doubled: u32) -> String {
    if doubled.is_multiple_of(2) {
        format!("{}", doubled / 2)
    } else {
        format!("{doubled}/2")
    }
}

/// Vibrational descriptor.
///
/// Diatomics carry a single quantum number; linear triatomics carry a
/// (v1, v2, v3) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Vibrational {
    Single(u32),
    Triple(u32, u32, u32),
}

impl Vibrational {
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Single(v) => format!("v={v}"),
            Self::Triple(v1, v2, v3) => format!("v={v1},{v2},{v3}"),
        }
    }
}

// =============================================================================
// SPECIES NODE
// =============================================================================

/// Excitation level of a species node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpeciesLevel {
    Particle,
    Electronic,
    Vibrational,
    Rotational,
}

/// The structural content of a species node, minus the rendered
/// summary. This is the content-address key: two submissions that
/// describe the same physical state collapse onto one node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalSpecies {
    pub particle: String,
    pub charge: i32,
    pub electronic: Option<ElectronicTerm>,
    pub vibrational: Option<Vibrational>,
    pub rotational: Option<u32>,
}

impl CanonicalSpecies {
    /// The excitation level implied by the deepest populated field.
    #[must_use]
    pub fn level(&self) -> SpeciesLevel {
        if self.rotational.is_some() {
            SpeciesLevel::Rotational
        } else if self.vibrational.is_some() {
            SpeciesLevel::Vibrational
        } else if self.electronic.is_some() {
            SpeciesLevel::Electronic
        } else {
            SpeciesLevel::Particle
        }
    }

    /// The canonical content of this node's parent in the hierarchy,
    /// or `None` for a particle-level node.
    #[must_use]
    pub fn parent(&self) -> Option<CanonicalSpecies> {
        let mut parent = self.clone();
        if parent.rotational.take().is_some() {
            return Some(parent);
        }
        if parent.vibrational.take().is_some() {
            return Some(parent);
        }
        if parent.electronic.take().is_some() {
            return Some(parent);
        }
        None
    }

    /// Render the human-readable summary, e.g. `N2{X,v=3,J=2}` or `Ar^+`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = self.particle.clone();
        out.push_str(&charge_summary(self.charge));
        let mut inner: Vec<String> = Vec::new();
        if let Some(term) = &self.electronic {
            inner.push(term.summary());
        }
        if let Some(vib) = &self.vibrational {
            inner.push(vib.summary());
        }
        if let Some(j) = self.rotational {
            inner.push(format!("J={j}"));
        }
        if !inner.is_empty() {
            out.push('{');
            out.push_str(&inner.join(","));
            out.push('}');
        }
        out
    }
}

fn charge_summary(charge: i32) -> String {
    match charge {
        0 => String::new(),
        1 => "^+".to_string(),
        -1 => "^-".to_string(),
        c if c > 0 => format!("^{c}+"),
        c => format!("^{}-", -c),
    }
}

/// A stored species node: canonical content plus its rendered summary.
///
/// The summary is denormalized at insert time so views and facets never
/// re-render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesNode {
    pub canonical: CanonicalSpecies,
    pub serialized: String,
}

impl SpeciesNode {
    #[must_use]
    pub fn from_canonical(canonical: CanonicalSpecies) -> Self {
        let serialized = canonical.summary();
        Self {
            canonical,
            serialized,
        }
    }
}

// =============================================================================
// SUBMISSION-SIDE INPUT
// =============================================================================

/// A species description as delivered in a submission: one particle
/// with at most one refinement chain below it.
///
/// The chain expands top-down into up to four hierarchy nodes linked by
/// parent edges; see `Catalog::upsert_species_tree`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesInput {
    pub particle: String,
    #[serde(default)]
    pub charge: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electronic: Option<ElectronicInput>,
}

/// Electronic refinement of a [`SpeciesInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectronicInput {
    pub term: ElectronicTerm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibrational: Option<VibrationalInput>,
}

/// Vibrational refinement of an [`ElectronicInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibrationalInput {
    pub level: Vibrational,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotational: Option<u32>,
}

impl SpeciesInput {
    /// Flatten the chain into canonical node contents, shallowest
    /// first. The last element is the leaf the submission refers to.
    #[must_use]
    pub fn expand(&self) -> Vec<CanonicalSpecies> {
        let mut chain = Vec::with_capacity(4);
        let mut node = CanonicalSpecies {
            particle: self.particle.clone(),
            charge: self.charge,
            electronic: None,
            vibrational: None,
            rotational: None,
        };
        chain.push(node.clone());
        let Some(electronic) = &self.electronic else {
            return chain;
        };
        node.electronic = Some(electronic.term.clone());
        chain.push(node.clone());
        let Some(vibrational) = &electronic.vibrational else {
            return chain;
        };
        node.vibrational = Some(vibrational.level);
        chain.push(node.clone());
        let Some(rotational) = vibrational.rotational else {
            return chain;
        };
        node.rotational = Some(rotational);
        chain.push(node);
        chain
    }

    /// Validate structural limits before any storage mutation.
    pub fn validate(&self) -> Result<(), XsecError> {
        if self.particle.is_empty() {
            return Err(XsecError::InvalidSubmission(
                "species particle name is empty".to_string(),
            ));
        }
        if self.particle.len() > crate::primitives::MAX_LABEL_LENGTH {
            return Err(XsecError::InvalidSubmission(format!(
                "species particle name exceeds {} bytes",
                crate::primitives::MAX_LABEL_LENGTH
            )));
        }
        Ok(())
    }
}

// =============================================================================
// SEARCH STATE PATHS
// =============================================================================

/// One step of a [`StatePath`], selecting a node at its level either by
/// summary or by omitting the remainder of the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStep {
    /// Match this node exactly and ignore children entirely.
    Omit,
    /// Match the node with this rendered summary at this level.
    Summary(String),
}

/// A root-to-depth selection through the species hierarchy used by the
/// search template.
///
/// The per-level entries follow the hierarchy order: particle,
/// electronic, vibrational, rotational. A missing level means "any
/// descendant at or below the last named level".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePath {
    pub steps: Vec<PathStep>,
}

/// Resolution of a [`StatePath`]: the deepest concretely-named node's
/// summary, plus whether descendants of that node also match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLeaf {
    pub serialized: String,
    pub include_children: bool,
}

impl StatePath {
    /// Resolve the path to its leaf.
    ///
    /// Returns `None` for an empty path (matches anything, contributes
    /// no predicate). A trailing `Omit` pins the match to the named
    /// node itself; a path that ends at a named summary matches that
    /// node and everything beneath it.
    #[must_use]
    pub fn leaf(&self) -> Option<StateLeaf> {
        let mut deepest: Option<&str> = None;
        let mut include_children = true;
        for step in &self.steps {
            match step {
                PathStep::Omit => {
                    include_children = false;
                    break;
                }
                PathStep::Summary(summary) => {
                    deepest = Some(summary);
                }
            }
        }
        deepest.map(|serialized| StateLeaf {
            serialized: serialized.to_string(),
            include_children,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn n2_rotational() -> CanonicalSpecies {
        CanonicalSpecies {
            particle: "N2".to_string(),
            charge: 0,
            electronic: Some(ElectronicTerm::Unspecified("X".to_string())),
            vibrational: Some(Vibrational::Single(3)),
            rotational: Some(2),
        }
    }

    #[test]
    fn summary_renders_full_chain() {
        assert_eq!(n2_rotational().summary(), "N2{X,v=3,J=2}");
    }

    #[test]
    fn summary_renders_charges() {
        let ion = CanonicalSpecies {
            particle: "Ar".to_string(),
            charge: 1,
            electronic: None,
            vibrational: None,
            rotational: None,
        };
        assert_eq!(ion.summary(), "Ar^+");
        let doubly = CanonicalSpecies {
            charge: 2,
            ..ion.clone()
        };
        assert_eq!(doubly.summary(), "Ar^2+");
        let anion = CanonicalSpecies { charge: -1, ..ion };
        assert_eq!(anion.summary(), "Ar^-");
    }

    #[test]
    fn parent_strips_deepest_level() {
        let leaf = n2_rotational();
        let vib = leaf.parent().expect("rotational has parent");
        assert_eq!(vib.level(), SpeciesLevel::Vibrational);
        let ele = vib.parent().expect("vibrational has parent");
        assert_eq!(ele.level(), SpeciesLevel::Electronic);
        let particle = ele.parent().expect("electronic has parent");
        assert_eq!(particle.level(), SpeciesLevel::Particle);
        assert!(particle.parent().is_none());
    }

    #[test]
    fn expand_produces_chain_shallowest_first() {
        let input = SpeciesInput {
            particle: "N2".to_string(),
            charge: 0,
            electronic: Some(ElectronicInput {
                term: ElectronicTerm::Unspecified("X".to_string()),
                vibrational: Some(VibrationalInput {
                    level: Vibrational::Single(3),
                    rotational: Some(2),
                }),
            }),
        };
        let chain = input.expand();
        assert_eq!(chain.len(), 4);
        assert_eq!(chain[0].level(), SpeciesLevel::Particle);
        assert_eq!(chain[3].level(), SpeciesLevel::Rotational);
        assert_eq!(chain[3], n2_rotational());
    }

    #[test]
    fn bare_particle_expands_to_single_node() {
        let input = SpeciesInput {
            particle: "e".to_string(),
            charge: -1,
            electronic: None,
        };
        let chain = input.expand();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].summary(), "e^-");
    }

    #[test]
    fn atom_ls_term_summary() {
        let term = ElectronicTerm::AtomLs {
            double_spin: 1,
            orbital: 1,
            double_total: 3,
            odd_parity: true,
        };
        assert_eq!(term.summary(), "2P°_3/2");
    }

    #[test]
    fn diatomic_term_summary() {
        let term = ElectronicTerm::Diatomic {
            state: "X".to_string(),
            multiplicity: 1,
            lambda: 0,
            reflection: Some('+'),
            parity: Some('g'),
        };
        assert_eq!(term.summary(), "X 1Sg+");
    }

    #[test]
    fn linear_triatom_term_summary() {
        let term = ElectronicTerm::LinearTriatom {
            state: "X".to_string(),
            multiplicity: 1,
            lambda: 0,
            parity: 'u',
            reflection: Some('+'),
        };
        assert_eq!(term.summary(), "X 1Su+");
    }

    #[test]
    fn leaf_of_path_ending_at_summary_includes_children() {
        let path = StatePath {
            steps: vec![
                PathStep::Summary("N2".to_string()),
                PathStep::Summary("N2{X}".to_string()),
            ],
        };
        let leaf = path.leaf().expect("non-empty path has a leaf");
        assert_eq!(leaf.serialized, "N2{X}");
        assert!(leaf.include_children);
    }

    #[test]
    fn leaf_of_path_ending_at_omit_excludes_children() {
        let path = StatePath {
            steps: vec![PathStep::Summary("N2".to_string()), PathStep::Omit],
        };
        let leaf = path.leaf().expect("non-empty path has a leaf");
        assert_eq!(leaf.serialized, "N2");
        assert!(!leaf.include_children);
    }

    #[test]
    fn empty_path_has_no_leaf() {
        let path = StatePath { steps: vec![] };
        assert!(path.leaf().is_none());
    }
}
