//! # Set Lifecycle Operations
//!
//! Sets are the publication unit: a named group of items owned by one
//! organization. Editing a set edits its members through it, so the
//! member-resolution rules here decide when a submitted process reuses
//! an existing item, forks an indirect draft of it, or becomes a new
//! item.
//!
//! Publishing a set publishes its draft members. The orphan check runs
//! first: if publishing a draft member would archive a published item
//! that other published sets still reference, the whole publish is
//! rejected with one aggregate error naming every offending member.

use chrono::{DateTime, Utc};

use crate::catalog::{Catalog, SetRecord};
use crate::lifecycle::next_version;
use crate::primitives::{INITIAL_VERSION, MAX_LABEL_LENGTH, MAX_SET_MEMBERS};
use crate::reaction::{ProcessInput, SubmissionDicts};
use crate::types::{
    ItemKey, KeyedVersionInfo, OrganizationKey, OrphanedDraft, RecordKind, SetKey, Status,
    VersionInfo, XsecError, validate_message,
};

// =============================================================================
// SUBMISSIONS
// =============================================================================

/// One process inside a set submission. `existing` names the item this
/// process edits; absent for a process new to the set.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SetProcess {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing: Option<ItemKey>,
    pub process: ProcessInput,
}

/// A complete set submission.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SetSubmission {
    pub contributor: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub dicts: SubmissionDicts,
    pub processes: Vec<SetProcess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
}

impl SetSubmission {
    fn validate(&self) -> Result<(), XsecError> {
        if self.name.is_empty() {
            return Err(XsecError::InvalidSubmission("set name is empty".to_string()));
        }
        if self.name.len() > MAX_LABEL_LENGTH {
            return Err(XsecError::InvalidSubmission(format!(
                "set name exceeds {MAX_LABEL_LENGTH} bytes"
            )));
        }
        if self.processes.len() > MAX_SET_MEMBERS {
            return Err(XsecError::InvalidSubmission(format!(
                "set has more than {MAX_SET_MEMBERS} processes"
            )));
        }
        if let Some(message) = &self.commit_message {
            validate_message(message)?;
        }
        Ok(())
    }
}

impl Catalog {
    // ========================================================================
    // MEMBER RESOLUTION
    // ========================================================================

    /// Resolve one submitted process to the item key the set should
    /// reference.
    ///
    /// - names an existing item whose content is unchanged: reuse it
    /// - names an item owned by the same organization with changed
    ///   content: edit it (in place for drafts, an indirect draft fork
    ///   for published items)
    /// - otherwise (new to the set, foreign, or the named key is
    ///   gone): a fresh draft item
    fn resolve_member(
        &mut self,
        set_name: &str,
        contributor: OrganizationKey,
        dicts: &SubmissionDicts,
        entry: &SetProcess,
        now: DateTime<Utc>,
    ) -> Result<ItemKey, XsecError> {
        let contributor_name = self
            .organization_name(contributor)
            .unwrap_or_default()
            .to_string();
        let resolved = self.resolve_process(&contributor_name, dicts, &entry.process)?;
        let candidate = Self::record_from_resolved(
            resolved,
            VersionInfo::new(Status::Draft, INITIAL_VERSION, now, None),
        );
        let Some(existing) = entry.existing else {
            return Ok(self.alloc_item(candidate));
        };
        // A dangling key (deleted, or never ours) is treated like a
        // process new to the set.
        let stored = match self.items.get(&existing) {
            Some(record) => record,
            None => return Ok(self.alloc_item(candidate)),
        };
        if stored.content_equal(&candidate) {
            return Ok(existing);
        }
        if stored.contributor != contributor {
            return Ok(self.alloc_item(candidate));
        }
        match stored.version.status {
            Status::Draft => {
                let record = self.item_mut(existing)?;
                record.reaction = candidate.reaction;
                record.references = candidate.references;
                record.data = candidate.data;
                record.threshold = candidate.threshold;
                record.comments = candidate.comments;
                record.version.created_on = now;
                Ok(existing)
            }
            Status::Published => {
                if let Some(open) = self.item_history.draft_of(existing) {
                    return Err(XsecError::DraftAlreadyExists {
                        kind: RecordKind::Item,
                        key: existing.0,
                        existing: open.0,
                    });
                }
                let version = next_version(&stored.version.version)?;
                let mut draft = candidate;
                draft.version = VersionInfo::new(
                    Status::Draft,
                    version,
                    now,
                    Some(format!("Indirect draft by editing set {set_name}")),
                );
                let key = self.alloc_item(draft);
                self.item_history.link(key, existing)?;
                Ok(key)
            }
            status => Err(XsecError::InvalidStatusTransition {
                kind: RecordKind::Item,
                key: existing.0,
                status,
                operation: "edit through set",
            }),
        }
    }

    fn stage_members(
        &mut self,
        set: SetKey,
        set_name: &str,
        contributor: OrganizationKey,
        dicts: &SubmissionDicts,
        processes: &[SetProcess],
        now: DateTime<Utc>,
    ) -> Result<(), XsecError> {
        for entry in processes {
            let member = self.resolve_member(set_name, contributor, dicts, entry, now)?;
            self.link_member(set, member);
        }
        Ok(())
    }

    /// Hard-remove a draft item that no set references anymore.
    fn sweep_orphan_draft(&mut self, item: ItemKey) {
        let is_orphan_draft = self
            .items
            .get(&item)
            .is_some_and(|record| record.version.status == Status::Draft)
            && self.containing_sets(item).is_empty();
        if is_orphan_draft {
            self.items.remove(&item);
            self.item_history.remove_all(item);
        }
    }

    // ========================================================================
    // LIFECYCLE OPERATIONS
    // ========================================================================

    /// Create a draft set at version 1, resolving every process into a
    /// member item.
    pub fn create_set(
        &mut self,
        submission: &SetSubmission,
        now: DateTime<Utc>,
    ) -> Result<SetKey, XsecError> {
        submission.validate()?;
        let contributor = self.upsert_organization(&submission.contributor);
        let set = self.alloc_set(SetRecord {
            version: VersionInfo::new(
                Status::Draft,
                INITIAL_VERSION,
                now,
                submission.commit_message.clone(),
            ),
            contributor,
            name: submission.name.clone(),
            description: submission.description.clone(),
            complete: submission.complete,
        });
        self.stage_members(
            set,
            &submission.name,
            contributor,
            &submission.dicts,
            &submission.processes,
            now,
        )?;
        Ok(set)
    }

    /// Edit a set. Draft sets are replaced in place (membership is
    /// diffed, drafts no set references anymore are swept); editing a
    /// published set forks a draft of it at the next version.
    pub fn update_set(
        &mut self,
        key: SetKey,
        submission: &SetSubmission,
        now: DateTime<Utc>,
    ) -> Result<SetKey, XsecError> {
        submission.validate()?;
        let status = self.set(key)?.version.status;
        match status {
            Status::Draft => {
                let contributor = self.upsert_organization(&submission.contributor);
                let previous = self.members(key);
                for member in &previous {
                    self.unlink_member(key, *member);
                }
                let staged = self.stage_members(
                    key,
                    &submission.name,
                    contributor,
                    &submission.dicts,
                    &submission.processes,
                    now,
                );
                // Sweep after staging so members the new payload keeps
                // are never removed.
                for member in previous {
                    self.sweep_orphan_draft(member);
                }
                staged?;
                let record = self.set_mut(key)?;
                record.contributor = contributor;
                record.name = submission.name.clone();
                record.description = submission.description.clone();
                record.complete = submission.complete;
                record.version.created_on = now;
                if submission.commit_message.is_some() {
                    record.version.commit_message = submission.commit_message.clone();
                }
                Ok(key)
            }
            Status::Published => {
                if let Some(existing) = self.set_history.draft_of(key) {
                    return Err(XsecError::DraftAlreadyExists {
                        kind: RecordKind::Set,
                        key: key.0,
                        existing: existing.0,
                    });
                }
                let contributor = self.upsert_organization(&submission.contributor);
                let version = next_version(&self.set(key)?.version.version)?;
                let draft = self.alloc_set(SetRecord {
                    version: VersionInfo::new(
                        Status::Draft,
                        version,
                        now,
                        submission.commit_message.clone(),
                    ),
                    contributor,
                    name: submission.name.clone(),
                    description: submission.description.clone(),
                    complete: submission.complete,
                });
                self.set_history.link(draft, key)?;
                self.stage_members(
                    draft,
                    &submission.name,
                    contributor,
                    &submission.dicts,
                    &submission.processes,
                    now,
                )?;
                Ok(draft)
            }
            status => Err(XsecError::InvalidStatusTransition {
                kind: RecordKind::Set,
                key: key.0,
                status,
                operation: "update",
            }),
        }
    }

    /// Publish a draft set: publish its draft members, archive the
    /// previous published version of its lineage, and mark it
    /// published. Publishing an already-published set is a no-op.
    ///
    /// Fails atomically with an aggregate error if publishing any
    /// draft member would archive a published item other published
    /// sets still reference.
    pub fn publish_set(&mut self, key: SetKey) -> Result<(), XsecError> {
        let status = self.set(key)?.version.status;
        match status {
            Status::Published => Ok(()),
            Status::Draft => {
                let orphans = self.orphan_check(key);
                if !orphans.is_empty() {
                    return Err(XsecError::PublishWouldOrphanDraft(orphans));
                }
                for member in self.members(key) {
                    if self.item(member)?.version.status == Status::Draft {
                        self.publish_item(member)?;
                    }
                }
                if let Some(previous) = self.published_set_sibling(key) {
                    self.set_mut(previous)?.version.status = Status::Archived;
                }
                self.set_mut(key)?.version.status = Status::Published;
                Ok(())
            }
            status => Err(XsecError::InvalidStatusTransition {
                kind: RecordKind::Set,
                key: key.0,
                status,
                operation: "publish",
            }),
        }
    }

    /// The members whose publication would strand other published
    /// sets. Sets in this set's own lineage never count.
    fn orphan_check(&self, key: SetKey) -> Vec<OrphanedDraft> {
        let own_lineage = self.set_history.chain(key);
        let mut orphans = Vec::new();
        for member in self.members(key) {
            let Some(record) = self.items.get(&member) else {
                continue;
            };
            if record.version.status != Status::Draft {
                continue;
            }
            let Some(published) = self.published_sibling(member) else {
                continue;
            };
            let other_sets: Vec<SetKey> = self
                .containing_sets_with_status(published, Status::Published)
                .into_iter()
                .filter(|set| !own_lineage.contains(set))
                .collect();
            if !other_sets.is_empty() {
                orphans.push(OrphanedDraft {
                    draft: member,
                    published,
                    other_sets,
                });
            }
        }
        orphans
    }

    /// The published member of `key`'s set lineage, excluding `key`.
    fn published_set_sibling(&self, key: SetKey) -> Option<SetKey> {
        self.set_history
            .chain(key)
            .into_iter()
            .filter(|member| *member != key)
            .find(|member| {
                self.sets
                    .get(member)
                    .is_some_and(|record| record.version.status == Status::Published)
            })
    }

    /// Delete a draft set or retract a published one.
    ///
    /// Deleting a draft unlinks its members and sweeps drafts no other
    /// set references. Retracting a published set requires a message
    /// and cascades to published members that no other published or
    /// draft set references; the membership edges are kept for
    /// history.
    pub fn delete_set(&mut self, key: SetKey, message: Option<&str>) -> Result<(), XsecError> {
        let status = self.set(key)?.version.status;
        match status {
            Status::Draft => {
                for member in self.members(key) {
                    self.unlink_member(key, member);
                    self.sweep_orphan_draft(member);
                }
                self.sets.remove(&key);
                self.set_history.remove_all(key);
                Ok(())
            }
            Status::Published => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .ok_or(XsecError::MissingRetractMessage(RecordKind::Set))?
                    .to_string();
                validate_message(&message)?;
                for member in self.members(key) {
                    let still_referenced = self
                        .containing_sets(member)
                        .into_iter()
                        .filter(|set| *set != key)
                        .any(|set| {
                            self.sets.get(&set).is_some_and(|record| {
                                matches!(record.version.status, Status::Published | Status::Draft)
                            })
                        });
                    if still_referenced {
                        continue;
                    }
                    let record = self.item_mut(member)?;
                    if record.version.status == Status::Published {
                        record.version.status = Status::Retracted;
                        record.version.retract_message = Some(message.clone());
                    }
                }
                let record = self.set_mut(key)?;
                record.version.status = Status::Retracted;
                record.version.retract_message = Some(message);
                Ok(())
            }
            status => Err(XsecError::InvalidStatusTransition {
                kind: RecordKind::Set,
                key: key.0,
                status,
                operation: "delete",
            }),
        }
    }

    /// Version history of the lineage containing `key`: every
    /// non-draft member, newest first.
    pub fn set_history(&self, key: SetKey) -> Result<Vec<KeyedVersionInfo<SetKey>>, XsecError> {
        self.set(key)?;
        let mut entries: Vec<KeyedVersionInfo<SetKey>> = self
            .set_history
            .chain(key)
            .into_iter()
            .filter_map(|member| {
                let record = self.sets.get(&member)?;
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
mod tests {
    use super::*;
    use crate::item::tests::elastic_submission;
    use crate::item::ItemSubmission;
    use crate::types::ItemKey;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn submission_from_item(item: &ItemSubmission, name: &str) -> SetSubmission {
        SetSubmission {
            contributor: item.contributor.clone(),
            name: name.to_string(),
            description: "test data".to_string(),
            complete: false,
            dicts: item.dicts.clone(),
            processes: vec![SetProcess {
                existing: None,
                process: item.process.clone(),
            }],
            commit_message: Some("initial import".to_string()),
        }
    }

    #[test]
    fn create_set_creates_draft_members() {
        let mut catalog = Catalog::new();
        let submission = submission_from_item(&elastic_submission("lab"), "Ar set");
        let set = catalog.create_set(&submission, now()).expect("create");
        let members = catalog.members(set);
        assert_eq!(members.len(), 1);
        let record = catalog.item(members[0]).expect("member exists");
        assert_eq!(record.version.status, Status::Draft);
        assert_eq!(catalog.set(set).expect("exists").version.status, Status::Draft);
    }

    #[test]
    fn publish_set_publishes_members() {
        let mut catalog = Catalog::new();
        let submission = submission_from_item(&elastic_submission("lab"), "Ar set");
        let set = catalog.create_set(&submission, now()).expect("create");
        catalog.publish_set(set).expect("publish");
        assert_eq!(catalog.set(set).expect("exists").version.status, Status::Published);
        let member = catalog.members(set)[0];
        assert_eq!(catalog.item(member).expect("exists").version.status, Status::Published);
    }

    #[test]
    fn resolve_member_reuses_unchanged_item() {
        let mut catalog = Catalog::new();
        let item = elastic_submission("lab");
        let mut submission = submission_from_item(&item, "Ar set");
        let set = catalog.create_set(&submission, now()).expect("create");
        catalog.publish_set(set).expect("publish");
        let member = catalog.members(set)[0];

        // Same content resubmitted under the existing id: reuse.
        submission.processes[0].existing = Some(member);
        let draft = catalog.update_set(set, &submission, now()).expect("fork");
        assert_eq!(catalog.members(draft), vec![member]);
    }

    #[test]
    fn resolve_member_forks_changed_published_item() {
        let mut catalog = Catalog::new();
        let item = elastic_submission("lab");
        let mut submission = submission_from_item(&item, "Ar set");
        let set = catalog.create_set(&submission, now()).expect("create");
        catalog.publish_set(set).expect("publish");
        let member = catalog.members(set)[0];

        submission.processes[0].existing = Some(member);
        submission.processes[0].process.threshold = Some(0.5);
        let draft_set = catalog.update_set(set, &submission, now()).expect("fork");
        let draft_member = catalog.members(draft_set)[0];
        assert_ne!(draft_member, member);
        let record = catalog.item(draft_member).expect("exists");
        assert_eq!(record.version.status, Status::Draft);
        assert_eq!(record.version.version, "2");
        assert_eq!(
            record.version.commit_message.as_deref(),
            Some("Indirect draft by editing set Ar set")
        );
        // The published original still backs the published set.
        assert_eq!(catalog.members(set), vec![member]);
    }

    #[test]
    fn resolve_member_copies_foreign_item() {
        let mut catalog = Catalog::new();
        let item = elastic_submission("lab");
        let set = catalog
            .create_set(&submission_from_item(&item, "Ar set"), now())
            .expect("create");
        catalog.publish_set(set).expect("publish");
        let member = catalog.members(set)[0];

        // Another organization edits a copy of the process.
        let other_item = elastic_submission("other lab");
        let mut submission = submission_from_item(&other_item, "Ar fork");
        submission.processes[0].existing = Some(member);
        submission.processes[0].process.threshold = Some(0.5);
        let other_set = catalog.create_set(&submission, now()).expect("create");
        let copied = catalog.members(other_set)[0];
        assert_ne!(copied, member);
        assert_eq!(catalog.item(copied).expect("exists").version.version, "1");
    }

    #[test]
    fn update_draft_set_sweeps_dropped_draft_members() {
        let mut catalog = Catalog::new();
        let item = elastic_submission("lab");
        let mut submission = submission_from_item(&item, "Ar set");
        let set = catalog.create_set(&submission, now()).expect("create");
        let dropped = catalog.members(set)[0];

        submission.processes.clear();
        catalog.update_set(set, &submission, now()).expect("update");
        assert!(catalog.members(set).is_empty());
        assert!(catalog.item(dropped).is_err());
    }

    #[test]
    fn update_draft_set_refreshes_timestamp() {
        use chrono::TimeZone;
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("timestamp");
        let edited = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).single().expect("timestamp");
        let mut catalog = Catalog::new();
        let mut submission = submission_from_item(&elastic_submission("lab"), "Ar set");
        let set = catalog.create_set(&submission, created).expect("create");
        submission.description = "revised".to_string();
        catalog.update_set(set, &submission, edited).expect("update");
        assert_eq!(catalog.set(set).expect("exists").version.created_on, edited);
    }

    #[test]
    fn dropped_member_shared_with_another_set_survives() {
        let mut catalog = Catalog::new();
        let item = elastic_submission("lab");
        let mut first = submission_from_item(&item, "Ar set");
        let set = catalog.create_set(&first, now()).expect("create");
        let shared = catalog.members(set)[0];

        let mut second = submission_from_item(&item, "Ar mirror");
        second.processes[0].existing = Some(shared);
        let other = catalog.create_set(&second, now()).expect("create");
        assert_eq!(catalog.members(other), vec![shared]);

        first.processes.clear();
        catalog.update_set(set, &first, now()).expect("update");
        assert!(catalog.item(shared).is_ok());
        assert_eq!(catalog.containing_sets(shared), vec![other]);
    }

    #[test]
    fn publish_blocked_when_fork_would_orphan_other_set() {
        let mut catalog = Catalog::new();
        let item = elastic_submission("lab");
        let mut submission = submission_from_item(&item, "Ar set");
        let set = catalog.create_set(&submission, now()).expect("create");
        catalog.publish_set(set).expect("publish");
        let member = catalog.members(set)[0];

        // A second published set shares the published member.
        let mut mirror = submission_from_item(&item, "Ar mirror");
        mirror.processes[0].existing = Some(member);
        let mirror_set = catalog.create_set(&mirror, now()).expect("create");
        catalog.publish_set(mirror_set).expect("publish");

        // Fork the member through a draft revision of the first set.
        submission.processes[0].existing = Some(member);
        submission.processes[0].process.threshold = Some(0.5);
        let draft = catalog.update_set(set, &submission, now()).expect("fork");
        let err = catalog.publish_set(draft).expect_err("would orphan mirror");
        let XsecError::PublishWouldOrphanDraft(orphans) = err else {
            unreachable!("unexpected error kind");
        };
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].published, member);
        assert_eq!(orphans[0].other_sets, vec![mirror_set]);
        // Nothing was published or archived.
        assert_eq!(catalog.set(draft).expect("exists").version.status, Status::Draft);
        assert_eq!(catalog.item(member).expect("exists").version.status, Status::Published);
    }

    #[test]
    fn publish_new_set_version_archives_previous() {
        let mut catalog = Catalog::new();
        let item = elastic_submission("lab");
        let mut submission = submission_from_item(&item, "Ar set");
        let v1 = catalog.create_set(&submission, now()).expect("create");
        catalog.publish_set(v1).expect("publish v1");
        let member = catalog.members(v1)[0];

        submission.processes[0].existing = Some(member);
        submission.processes[0].process.threshold = Some(0.5);
        let v2 = catalog.update_set(v1, &submission, now()).expect("fork");
        catalog.publish_set(v2).expect("publish v2");

        assert_eq!(catalog.set(v1).expect("exists").version.status, Status::Archived);
        assert_eq!(catalog.set(v2).expect("exists").version.status, Status::Published);
        assert_eq!(catalog.item(member).expect("exists").version.status, Status::Archived);
        let new_member = catalog.members(v2)[0];
        assert_eq!(
            catalog.item(new_member).expect("exists").version.status,
            Status::Published
        );
    }

    #[test]
    fn delete_draft_set_sweeps_unshared_drafts() {
        let mut catalog = Catalog::new();
        let submission = submission_from_item(&elastic_submission("lab"), "Ar set");
        let set = catalog.create_set(&submission, now()).expect("create");
        let member = catalog.members(set)[0];
        catalog.delete_set(set, None).expect("delete");
        assert!(catalog.set(set).is_err());
        assert!(catalog.item(member).is_err());
    }

    #[test]
    fn retract_published_set_cascades_to_exclusive_members() {
        let mut catalog = Catalog::new();
        let submission = submission_from_item(&elastic_submission("lab"), "Ar set");
        let set = catalog.create_set(&submission, now()).expect("create");
        catalog.publish_set(set).expect("publish");
        let member = catalog.members(set)[0];

        let err = catalog.delete_set(set, None).expect_err("needs message");
        assert!(matches!(err, XsecError::MissingRetractMessage(RecordKind::Set)));

        catalog.delete_set(set, Some("superseded")).expect("retract");
        let record = catalog.set(set).expect("kept");
        assert_eq!(record.version.status, Status::Retracted);
        let item = catalog.item(member).expect("kept");
        assert_eq!(item.version.status, Status::Retracted);
        assert_eq!(item.version.retract_message.as_deref(), Some("superseded"));
    }

    #[test]
    fn retract_spares_members_shared_with_live_sets() {
        let mut catalog = Catalog::new();
        let item = elastic_submission("lab");
        let submission = submission_from_item(&item, "Ar set");
        let set = catalog.create_set(&submission, now()).expect("create");
        catalog.publish_set(set).expect("publish");
        let member = catalog.members(set)[0];

        let mut mirror = submission_from_item(&item, "Ar mirror");
        mirror.processes[0].existing = Some(member);
        let mirror_set = catalog.create_set(&mirror, now()).expect("create");
        catalog.publish_set(mirror_set).expect("publish");

        catalog.delete_set(set, Some("superseded")).expect("retract");
        assert_eq!(
            catalog.item(member).expect("exists").version.status,
            Status::Published
        );
    }

    #[test]
    fn set_history_excludes_drafts_newest_first() {
        let mut catalog = Catalog::new();
        let item = elastic_submission("lab");
        let mut submission = submission_from_item(&item, "Ar set");
        let v1 = catalog.create_set(&submission, now()).expect("create");
        catalog.publish_set(v1).expect("publish v1");
        let member = catalog.members(v1)[0];
        submission.processes[0].existing = Some(member);
        submission.processes[0].process.threshold = Some(0.5);
        let v2 = catalog.update_set(v1, &submission, now()).expect("fork");
        catalog.publish_set(v2).expect("publish v2");
        let mut third = submission.clone();
        third.processes[0].existing = Some(catalog.members(v2)[0]);
        third.processes[0].process.threshold = Some(0.7);
        let v3 = catalog.update_set(v2, &third, now()).expect("fork");

        let history = catalog.set_history(v1).expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].key, v2);
        assert_eq!(history[1].key, v1);
        assert!(history.iter().all(|entry| entry.key != v3));
    }

    #[test]
    fn dangling_existing_key_creates_fresh_item() {
        let mut catalog = Catalog::new();
        let mut submission = submission_from_item(&elastic_submission("lab"), "Ar set");
        submission.processes[0].existing = Some(ItemKey(99));
        let set = catalog.create_set(&submission, now()).expect("create");
        let members = catalog.members(set);
        assert_eq!(members.len(), 1);
        assert_ne!(members[0], ItemKey(99));
        let record = catalog.item(members[0]).expect("fresh draft");
        assert_eq!(record.version.status, Status::Draft);
        assert_eq!(record.version.version, INITIAL_VERSION);
    }
}
