//! # Version Lifecycle Engine
//!
//! The history graph links records of one kind into version lineages.
//! An edge runs from a draft to the record it was forked from; walking
//! edges in either direction recovers the full lineage of any member.
//!
//! Invariants maintained here and relied on by the item and set
//! operations:
//! - a record has at most one draft forked from it (draftless check)
//! - a lineage has at most one published member
//! - version numbers strictly increase along a lineage

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{RecordKey, XsecError};

// =============================================================================
// HISTORY GRAPH
// =============================================================================

/// Draft-to-base edges for one record kind, indexed both ways.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryGraph<K: Ord> {
    /// draft -> the record it was forked from
    forward: BTreeMap<K, K>,
    /// base -> the draft forked from it
    reverse: BTreeMap<K, K>,
}

impl<K: Ord> Default for HistoryGraph<K> {
    fn default() -> Self {
        Self {
            forward: BTreeMap::new(),
            reverse: BTreeMap::new(),
        }
    }
}

impl<K: RecordKey> HistoryGraph<K> {
    /// The draft forked from `base`, if one exists.
    #[must_use]
    pub fn draft_of(&self, base: K) -> Option<K> {
        self.reverse.get(&base).copied()
    }

    /// The record `draft` was forked from, if any.
    #[must_use]
    pub fn base_of(&self, draft: K) -> Option<K> {
        self.forward.get(&draft).copied()
    }

    /// Record that `draft` was forked from `base`.
    ///
    /// Fails with `DraftAlreadyExists` if `base` already has a draft;
    /// callers must not allocate the draft record before linking.
    pub fn link(&mut self, draft: K, base: K) -> Result<(), XsecError> {
        if let Some(existing) = self.reverse.get(&base) {
            return Err(XsecError::DraftAlreadyExists {
                kind: K::KIND,
                key: base.raw(),
                existing: existing.raw(),
            });
        }
        self.forward.insert(draft, base);
        self.reverse.insert(base, draft);
        Ok(())
    }

    /// Remove every edge touching `key`. Called when a record is hard
    /// removed; retraction keeps its edges.
    pub fn remove_all(&mut self, key: K) {
        if let Some(base) = self.forward.remove(&key) {
            self.reverse.remove(&base);
        }
        if let Some(draft) = self.reverse.remove(&key) {
            self.forward.remove(&draft);
        }
    }

    /// The full lineage containing `key`, oldest first.
    ///
    /// Walks forward edges to the root, then reverse edges back down
    /// through every fork.
    #[must_use]
    pub fn chain(&self, key: K) -> Vec<K> {
        let mut root = key;
        while let Some(base) = self.forward.get(&root) {
            root = *base;
        }
        let mut chain = vec![root];
        let mut cursor = root;
        while let Some(draft) = self.reverse.get(&cursor) {
            chain.push(*draft);
            cursor = *draft;
        }
        chain
    }
}

// =============================================================================
// VERSION NUMBERS
// =============================================================================

/// Compute the successor of a version string.
///
/// Versions are decimal integers rendered as text; anything else is a
/// data corruption and is reported, not coerced.
pub fn next_version(version: &str) -> Result<String, XsecError> {
    let current: u64 = version
        .parse()
        .map_err(|_| XsecError::InvalidVersion(version.to_string()))?;
    Ok((current + 1).to_string())
}

// =============================================================================
// TESTS
// =============================================================================
