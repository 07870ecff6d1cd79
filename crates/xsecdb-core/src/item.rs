//! # Item Lifecycle Operations
//!
//! Create, edit, publish, and retract individual item records. A draft
//! is edited by whole-record replacement under the same key; editing a
//! published item forks a new draft linked to it in the history graph.
//! Publishing a draft archives the published member of its lineage, so
//! a lineage never exposes two public versions at once.

use chrono::{DateTime, Utc};

use crate::catalog::{Catalog, ItemRecord};
use crate::lifecycle::next_version;
use crate::primitives::INITIAL_VERSION;
use crate::reaction::{ProcessInput, SubmissionDicts};
use crate::types::{
    ItemKey, KeyedVersionInfo, OrganizationKey, ReactionKey, RecordKind, ReferenceKey, Status,
    VersionInfo, XsecError, validate_message,
};

// =============================================================================
// SUBMISSIONS
// =============================================================================

/// A complete item submission: contributor, label dictionaries, and one
/// process.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemSubmission {
    pub contributor: String,
    #[serde(default)]
    pub dicts: SubmissionDicts,
    pub process: ProcessInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
}

/// A submission with its shared content resolved to catalog keys.
pub(crate) struct ResolvedProcess {
    pub contributor: OrganizationKey,
    pub reaction: ReactionKey,
    pub references: Vec<ReferenceKey>,
    pub process: ProcessInput,
}

impl Catalog {
    /// Resolve a submission's labels against its dictionaries,
    /// upserting every piece of shared content it names.
    pub(crate) fn resolve_process(
        &mut self,
        contributor: &str,
        dicts: &SubmissionDicts,
        process: &ProcessInput,
    ) -> Result<ResolvedProcess, XsecError> {
        let contributor = self.upsert_organization(contributor);
        let reaction = self.resolve_reaction(&process.reaction, &dicts.states)?;
        let mut references = Vec::with_capacity(process.references.len());
        for label in &process.references {
            let doc = dicts
                .references
                .get(label)
                .ok_or_else(|| XsecError::UnknownReferenceLabel(label.clone()))?;
            references.push(self.upsert_reference(doc.clone()));
        }
        references.sort_unstable();
        references.dedup();
        Ok(ResolvedProcess {
            contributor,
            reaction,
            references,
            process: process.clone(),
        })
    }

    pub(crate) fn record_from_resolved(resolved: ResolvedProcess, version: VersionInfo) -> ItemRecord {
        ItemRecord {
            version,
            contributor: resolved.contributor,
            reaction: resolved.reaction,
            references: resolved.references,
            data: resolved.process.data,
            threshold: resolved.process.threshold,
            comments: resolved.process.comments,
        }
    }

    // ========================================================================
    // LIFECYCLE OPERATIONS
    // ========================================================================

    /// Create a standalone draft item at version 1.
    pub fn create_item(
        &mut self,
        submission: &ItemSubmission,
        now: DateTime<Utc>,
    ) -> Result<ItemKey, XsecError> {
        if let Some(message) = &submission.commit_message {
            validate_message(message)?;
        }
        let resolved =
            self.resolve_process(&submission.contributor, &submission.dicts, &submission.process)?;
        let version = VersionInfo::new(
            Status::Draft,
            INITIAL_VERSION,
            now,
            submission.commit_message.clone(),
        );
        Ok(self.alloc_item(Self::record_from_resolved(resolved, version)))
    }

    /// Edit an item. Drafts are replaced in place and keep their key;
    /// editing a published item forks a new draft at the next version
    /// and returns the draft's key.
    pub fn update_item(
        &mut self,
        key: ItemKey,
        submission: &ItemSubmission,
        now: DateTime<Utc>,
    ) -> Result<ItemKey, XsecError> {
        if let Some(message) = &submission.commit_message {
            validate_message(message)?;
        }
        let status = self.item(key)?.version.status;
        match status {
            Status::Draft => {
                let resolved = self.resolve_process(
                    &submission.contributor,
                    &submission.dicts,
                    &submission.process,
                )?;
                let record = self.item_mut(key)?;
                record.contributor = resolved.contributor;
                record.reaction = resolved.reaction;
                record.references = resolved.references;
                record.data = resolved.process.data;
                record.threshold = resolved.process.threshold;
                record.comments = resolved.process.comments;
                record.version.created_on = now;
                if submission.commit_message.is_some() {
                    record.version.commit_message = submission.commit_message.clone();
                }
                Ok(key)
            }
            Status::Published => {
                // Reject before touching shared content or allocating.
                if let Some(existing) = self.item_history.draft_of(key) {
                    return Err(XsecError::DraftAlreadyExists {
                        kind: RecordKind::Item,
                        key: key.0,
                        existing: existing.0,
                    });
                }
                let version = next_version(&self.item(key)?.version.version)?;
                let resolved = self.resolve_process(
                    &submission.contributor,
                    &submission.dicts,
                    &submission.process,
                )?;
                let info =
                    VersionInfo::new(Status::Draft, version, now, submission.commit_message.clone());
                let draft = self.alloc_item(Self::record_from_resolved(resolved, info));
                self.item_history.link(draft, key)?;
                Ok(draft)
            }
            status => Err(XsecError::InvalidStatusTransition {
                kind: RecordKind::Item,
                key: key.0,
                status,
                operation: "update",
            }),
        }
    }

    /// Publish a draft item, archiving the published member of its
    /// lineage. Publishing an already-published item is a no-op.
    pub fn publish_item(&mut self, key: ItemKey) -> Result<(), XsecError> {
        let status = self.item(key)?.version.status;
        match status {
            Status::Published => Ok(()),
            Status::Draft => {
                if let Some(published) = self.published_sibling(key) {
                    self.item_mut(published)?.version.status = Status::Archived;
                }
                self.item_mut(key)?.version.status = Status::Published;
                Ok(())
            }
            status => Err(XsecError::InvalidStatusTransition {
                kind: RecordKind::Item,
                key: key.0,
                status,
                operation: "publish",
            }),
        }
    }

    /// The published member of `key`'s lineage, excluding `key` itself.
    pub(crate) fn published_sibling(&self, key: ItemKey) -> Option<ItemKey> {
        self.item_history
            .chain(key)
            .into_iter()
            .filter(|member| *member != key)
            .find(|member| {
                self.items
                    .get(member)
                    .is_some_and(|record| record.version.status == Status::Published)
            })
    }

    /// Delete a draft item or retract a published one.
    ///
    /// Either form is blocked while the item belongs to any set; the
    /// owning set operation must remove it instead. Retraction requires
    /// a message and keeps the record and its history.
    pub fn delete_item(&mut self, key: ItemKey, message: Option<&str>) -> Result<(), XsecError> {
        let status = self.item(key)?.version.status;
        let sets = self.containing_sets(key);
        if !sets.is_empty() {
            return Err(XsecError::ReferencedByContainer { item: key, sets });
        }
        match status {
            Status::Draft => {
                self.items.remove(&key);
                self.item_history.remove_all(key);
                Ok(())
            }
            Status::Published => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .ok_or(XsecError::MissingRetractMessage(RecordKind::Item))?;
                validate_message(message)?;
                let record = self.item_mut(key)?;
                record.version.status = Status::Retracted;
                record.version.retract_message = Some(message.to_string());
                Ok(())
            }
            status => Err(XsecError::InvalidStatusTransition {
                kind: RecordKind::Item,
                key: key.0,
                status,
                operation: "delete",
            }),
        }
    }

    /// Version history of the lineage containing `key`: every
    /// non-draft member, newest first.
    pub fn item_history(&self, key: ItemKey) -> Result<Vec<KeyedVersionInfo<ItemKey>>, XsecError> {
        self.item(key)?;
        let mut entries: Vec<KeyedVersionInfo<ItemKey>> = self
            .item_history
            .chain(key)
            .into_iter()
            .filter_map(|member| {
                let record = self.items.get(&member)?;
                (record.version.status != Status::Draft).then(|| KeyedVersionInfo {
                    key: member,
                    info: record.version.clone(),
                })
            })
            .collect();
        entries.sort_by_key(|entry| {
            std::cmp::Reverse(entry.info.version.parse::<u64>().unwrap_or(0))
        });
        Ok(entries)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reaction::{DataTable, ReactionEntry, ReactionInput, ReactionTypeTag};
    use crate::species::SpeciesInput;
    use std::collections::BTreeMap;

    pub(crate) fn elastic_submission(contributor: &str) -> ItemSubmission {
        let mut states = BTreeMap::new();
        states.insert(
            "e".to_string(),
            SpeciesInput {
                particle: "e".to_string(),
                charge: -1,
                electronic: None,
            },
        );
        states.insert(
            "Ar".to_string(),
            SpeciesInput {
                particle: "Ar".to_string(),
                charge: 0,
                electronic: None,
            },
        );
        ItemSubmission {
            contributor: contributor.to_string(),
            dicts: SubmissionDicts {
                states,
                references: BTreeMap::new(),
            },
            process: ProcessInput {
                reaction: ReactionInput {
                    consumes: vec![
                        ReactionEntry {
                            count: 1,
                            species: "e".to_string(),
                        },
                        ReactionEntry {
                            count: 1,
                            species: "Ar".to_string(),
                        },
                    ],
                    produces: vec![
                        ReactionEntry {
                            count: 1,
                            species: "e".to_string(),
                        },
                        ReactionEntry {
                            count: 1,
                            species: "Ar".to_string(),
                        },
                    ],
                    reversible: false,
                    type_tags: vec![ReactionTypeTag::Elastic],
                },
                references: vec![],
                data: DataTable {
                    labels: vec!["Energy".to_string(), "Cross section".to_string()],
                    units: vec!["eV".to_string(), "m^2".to_string()],
                    values: vec![vec![0.0, 6.0e-20], vec![1.0, 9.0e-20]],
                },
                threshold: None,
                comments: vec![],
            },
            commit_message: Some("initial import".to_string()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn create_item_starts_as_draft_version_one() {
        let mut catalog = Catalog::new();
        let key = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        let record = catalog.item(key).expect("exists");
        assert_eq!(record.version.status, Status::Draft);
        assert_eq!(record.version.version, "1");
    }

    #[test]
    fn update_draft_keeps_key_and_version() {
        let mut catalog = Catalog::new();
        let key = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        let mut changed = elastic_submission("lab");
        changed.process.threshold = Some(0.5);
        let updated = catalog.update_item(key, &changed, now()).expect("update");
        assert_eq!(updated, key);
        let record = catalog.item(key).expect("exists");
        assert_eq!(record.version.version, "1");
        assert_eq!(record.threshold, Some(0.5));
    }

    #[test]
    fn oversized_commit_message_is_rejected() {
        let mut catalog = Catalog::new();
        let mut submission = elastic_submission("lab");
        submission.commit_message =
            Some("x".repeat(crate::primitives::MAX_MESSAGE_LENGTH + 1));
        let err = catalog.create_item(&submission, now()).expect_err("too long");
        assert!(matches!(err, XsecError::InvalidSubmission(_)));
    }

    #[test]
    fn update_draft_refreshes_timestamp() {
        use chrono::TimeZone;
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("timestamp");
        let edited = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).single().expect("timestamp");
        let mut catalog = Catalog::new();
        let key = catalog
            .create_item(&elastic_submission("lab"), created)
            .expect("create");
        let mut changed = elastic_submission("lab");
        changed.process.threshold = Some(0.5);
        catalog.update_item(key, &changed, edited).expect("update");
        assert_eq!(catalog.item(key).expect("exists").version.created_on, edited);
    }

    #[test]
    fn update_published_forks_a_draft() {
        let mut catalog = Catalog::new();
        let base = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        catalog.publish_item(base).expect("publish");
        let draft = catalog
            .update_item(base, &elastic_submission("lab"), now())
            .expect("fork");
        assert_ne!(draft, base);
        let record = catalog.item(draft).expect("exists");
        assert_eq!(record.version.status, Status::Draft);
        assert_eq!(record.version.version, "2");
        assert_eq!(catalog.item(base).expect("exists").version.status, Status::Published);
    }

    #[test]
    fn second_fork_of_published_is_rejected() {
        let mut catalog = Catalog::new();
        let base = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        catalog.publish_item(base).expect("publish");
        catalog
            .update_item(base, &elastic_submission("lab"), now())
            .expect("first fork");
        let err = catalog
            .update_item(base, &elastic_submission("lab"), now())
            .expect_err("draftless check");
        assert!(matches!(err, XsecError::DraftAlreadyExists { .. }));
    }

    #[test]
    fn publish_draft_archives_previous_version() {
        let mut catalog = Catalog::new();
        let base = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        catalog.publish_item(base).expect("publish v1");
        let draft = catalog
            .update_item(base, &elastic_submission("lab"), now())
            .expect("fork");
        catalog.publish_item(draft).expect("publish v2");
        assert_eq!(catalog.item(base).expect("exists").version.status, Status::Archived);
        assert_eq!(catalog.item(draft).expect("exists").version.status, Status::Published);
    }

    #[test]
    fn publish_published_is_noop() {
        let mut catalog = Catalog::new();
        let key = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        catalog.publish_item(key).expect("publish");
        catalog.publish_item(key).expect("idempotent");
        assert_eq!(catalog.item(key).expect("exists").version.status, Status::Published);
    }

    #[test]
    fn publish_retracted_is_rejected() {
        let mut catalog = Catalog::new();
        let key = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        catalog.publish_item(key).expect("publish");
        catalog.delete_item(key, Some("withdrawn")).expect("retract");
        let err = catalog.publish_item(key).expect_err("terminal");
        assert!(matches!(
            err,
            XsecError::InvalidStatusTransition {
                status: Status::Retracted,
                ..
            }
        ));
    }

    #[test]
    fn delete_draft_removes_record() {
        let mut catalog = Catalog::new();
        let key = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        catalog.delete_item(key, None).expect("delete");
        assert!(catalog.item(key).is_err());
    }

    #[test]
    fn retract_requires_message() {
        let mut catalog = Catalog::new();
        let key = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        catalog.publish_item(key).expect("publish");
        let err = catalog.delete_item(key, None).expect_err("needs message");
        assert!(matches!(err, XsecError::MissingRetractMessage(RecordKind::Item)));
        catalog.delete_item(key, Some("bad data")).expect("retract");
        let record = catalog.item(key).expect("kept");
        assert_eq!(record.version.status, Status::Retracted);
        assert_eq!(record.version.retract_message.as_deref(), Some("bad data"));
    }

    #[test]
    fn history_excludes_drafts_and_is_newest_first() {
        let mut catalog = Catalog::new();
        let v1 = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        catalog.publish_item(v1).expect("publish v1");
        let v2 = catalog
            .update_item(v1, &elastic_submission("lab"), now())
            .expect("fork v2");
        catalog.publish_item(v2).expect("publish v2");
        let v3 = catalog
            .update_item(v2, &elastic_submission("lab"), now())
            .expect("fork v3");
        let history = catalog.item_history(v1).expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].key, v2);
        assert_eq!(history[0].info.version, "2");
        assert_eq!(history[1].key, v1);
        // the open draft is invisible in history
        assert!(history.iter().all(|entry| entry.key != v3));
    }

    #[test]
    fn content_equal_ignores_version_metadata() {
        let mut catalog = Catalog::new();
        let a = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        let b = catalog
            .create_item(&elastic_submission("lab"), now())
            .expect("create");
        let (a, b) = (
            catalog.item(a).expect("exists").clone(),
            catalog.item(b).expect("exists").clone(),
        );
        assert!(a.content_equal(&b));
    }
}
