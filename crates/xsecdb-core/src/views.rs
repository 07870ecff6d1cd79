//! # Read Models
//!
//! Fully-resolved views of stored records: every key replaced by the
//! content it points at, ready for serialization to JSON or a text
//! export. Views are built on demand and never stored.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::reaction::{DataTable, ReactionTypeTag, Reference};
use crate::types::{ItemKey, SetKey, VersionInfo, XsecError};

/// One side entry of a resolved reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionEntryView {
    pub count: u32,
    pub state: String,
}

/// A resolved reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionView {
    pub summary: String,
    pub consumes: Vec<ReactionEntryView>,
    pub produces: Vec<ReactionEntryView>,
    pub reversible: bool,
    pub type_tags: Vec<ReactionTypeTag>,
}

/// A resolved item record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub key: ItemKey,
    #[serde(flatten)]
    pub version: VersionInfo,
    pub contributor: String,
    pub reaction: ReactionView,
    pub references: Vec<Reference>,
    pub data: DataTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub comments: Vec<String>,
}

/// A resolved set record with its members expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetView {
    pub key: SetKey,
    #[serde(flatten)]
    pub version: VersionInfo,
    pub contributor: String,
    pub name: String,
    pub description: String,
    pub complete: bool,
    pub processes: Vec<ItemView>,
}

impl Catalog {
    /// Resolve an item record into a view.
    pub fn item_view(&self, key: ItemKey) -> Result<ItemView, XsecError> {
        let record = self.item(key)?;
        let node = self.reaction_node(record.reaction).ok_or_else(|| {
            XsecError::SerializationError(format!("item {key} references missing reaction"))
        })?;
        let resolve = |species| {
            self.species_node(species)
                .map(|node| node.serialized.clone())
                .unwrap_or_default()
        };
        let entry_views = |entries: &[(crate::types::SpeciesKey, u32)]| {
            entries
                .iter()
                .map(|(species, count)| ReactionEntryView {
                    count: *count,
                    state: resolve(*species),
                })
                .collect()
        };
        let reaction = ReactionView {
            summary: node.summary(resolve),
            consumes: entry_views(&node.canonical.consumes),
            produces: entry_views(&node.canonical.produces),
            reversible: node.canonical.reversible,
            type_tags: node.canonical.type_tags.clone(),
        };
        let references = record
            .references
            .iter()
            .filter_map(|reference| self.reference_doc(*reference).cloned())
            .collect();
        Ok(ItemView {
            key,
            version: record.version.clone(),
            contributor: self
                .organization_name(record.contributor)
                .unwrap_or_default()
                .to_string(),
            reaction,
            references,
            data: record.data.clone(),
            threshold: record.threshold,
            comments: record.comments.clone(),
        })
    }

    /// Resolve a set record and all its members into a view.
    pub fn set_view(&self, key: SetKey) -> Result<SetView, XsecError> {
        let record = self.set(key)?;
        let mut processes = Vec::new();
        for member in self.members(key) {
            processes.push(self.item_view(member)?);
        }
        Ok(SetView {
            key,
            version: record.version.clone(),
            contributor: self
                .organization_name(record.contributor)
                .unwrap_or_default()
                .to_string(),
            name: record.name.clone(),
            description: record.description.clone(),
            complete: record.complete,
            processes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::tests::elastic_submission;
    use chrono::Utc;

    #[test]
    fn item_view_resolves_all_keys() {
        let mut catalog = Catalog::new();
        let key = catalog
            .create_item(&elastic_submission("lab"), Utc::now())
            .expect("create");
        let view = catalog.item_view(key).expect("view");
        assert_eq!(view.contributor, "lab");
        assert_eq!(view.reaction.summary, "e^- + Ar -> e^- + Ar");
        assert_eq!(view.reaction.type_tags, vec![ReactionTypeTag::Elastic]);
        assert_eq!(view.data.labels.len(), 2);
    }

    #[test]
    fn set_view_expands_members() {
        use crate::set::{SetProcess, SetSubmission};
        let mut catalog = Catalog::new();
        let item = elastic_submission("lab");
        let submission = SetSubmission {
            contributor: item.contributor.clone(),
            name: "Ar set".to_string(),
            description: "elastic only".to_string(),
            complete: false,
            dicts: item.dicts.clone(),
            processes: vec![SetProcess {
                existing: None,
                process: item.process.clone(),
            }],
            commit_message: None,
        };
        let set = catalog.create_set(&submission, Utc::now()).expect("create");
        let view = catalog.set_view(set).expect("view");
        assert_eq!(view.name, "Ar set");
        assert_eq!(view.processes.len(), 1);
        assert_eq!(view.processes[0].contributor, "lab");
    }
}
