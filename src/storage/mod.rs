// src/storage/mod.rs - Publication store, typed update commands, audit log

use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{CoreError, EntityKind, Result};
use crate::models::core::{Grant, Publication};
use crate::models::matching::{AuditEntry, MatchCandidate, MatchDecision};

/// A record plus the store revision it was read at. `apply` takes the
/// revision back as its precondition, so two writers racing on the same
/// publication cannot both succeed.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub revision: u64,
    pub doc: T,
}

/// Named update commands. Every mutation of a publication goes through one
/// of these instead of open-ended field assignment, and a batch is applied
/// atomically or not at all.
#[derive(Debug, Clone)]
pub enum PublicationCommand {
    /// Replace the working candidate list wholesale.
    ReplaceCandidates(Vec<MatchCandidate>),
    /// Append one entry to the publication's audit trail.
    AppendAudit(AuditEntry),
    /// Set (or overwrite) the final human decision.
    SetDecision(MatchDecision),
    /// Record an accepted grant link if not already present.
    AddMatchedGrant(String),
    /// Drop one candidate from the working list. Its audit history stays.
    RemoveCandidate(String),
    /// Store the last computed data-health score.
    SetComplianceScore(u8),
}

/// Conditional read-modify-write access to publications, plus the
/// insert-only audit log. The audit log is kept outside the publication
/// record so audit durability never depends on the record's own update
/// path.
pub trait PublicationStore: Send + Sync {
    fn get(&self, doi: &str) -> Result<Versioned<Publication>>;

    fn insert(&self, publication: Publication);

    /// Apply a command batch if the record is still at `expected_revision`.
    /// Fails with [`CoreError::Conflict`] when another writer intervened,
    /// with [`CoreError::InvalidInput`] when a candidate or decision
    /// mutation arrives without an accompanying audit entry.
    fn apply(
        &self,
        doi: &str,
        expected_revision: u64,
        commands: Vec<PublicationCommand>,
    ) -> Result<Publication>;

    /// Full audit history for a publication, in insertion order.
    fn audit_history(&self, doi: &str) -> Vec<AuditEntry>;
}

/// Read access to the grant universe.
pub trait GrantRepo: Send + Sync {
    fn find_by_grant_id(&self, grant_id: &str) -> Option<Grant>;
    fn all(&self) -> Vec<Grant>;
}

/// Audit invariant: candidate and decision mutations must carry at least
/// one audit entry in the same batch. An empty candidate replacement is the
/// one exception (a run that found nothing appends nothing).
fn requires_audit(commands: &[PublicationCommand]) -> bool {
    commands.iter().any(|c| match c {
        PublicationCommand::ReplaceCandidates(list) => !list.is_empty(),
        PublicationCommand::SetDecision(_)
        | PublicationCommand::AddMatchedGrant(_)
        | PublicationCommand::RemoveCandidate(_) => true,
        PublicationCommand::AppendAudit(_) | PublicationCommand::SetComplianceScore(_) => false,
    })
}

fn carries_audit(commands: &[PublicationCommand]) -> bool {
    commands
        .iter()
        .any(|c| matches!(c, PublicationCommand::AppendAudit(_)))
}

struct Record {
    revision: u64,
    publication: Publication,
}

/// In-memory implementation backing the pipeline binary and tests. A coarse
/// mutex serializes writers; the revision check turns a lost race into a
/// visible [`CoreError::Conflict`] instead of a silent lost update.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Record>>,
    audit: Mutex<Vec<(String, AuditEntry)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PublicationStore for MemoryStore {
    fn get(&self, doi: &str) -> Result<Versioned<Publication>> {
        let records = self.records.lock().unwrap();
        records
            .get(doi)
            .map(|r| Versioned {
                revision: r.revision,
                doc: r.publication.clone(),
            })
            .ok_or_else(|| CoreError::not_found(EntityKind::Publication, doi))
    }

    fn insert(&self, publication: Publication) {
        let mut records = self.records.lock().unwrap();
        records.insert(
            publication.doi.clone(),
            Record {
                revision: 0,
                publication,
            },
        );
    }

    fn apply(
        &self,
        doi: &str,
        expected_revision: u64,
        commands: Vec<PublicationCommand>,
    ) -> Result<Publication> {
        if requires_audit(&commands) && !carries_audit(&commands) {
            return Err(CoreError::InvalidInput(
                "candidate or decision mutation without audit entry".to_string(),
            ));
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(doi)
            .ok_or_else(|| CoreError::not_found(EntityKind::Publication, doi))?;
        if record.revision != expected_revision {
            return Err(CoreError::Conflict {
                id: doi.to_string(),
            });
        }

        let mut appended = Vec::new();
        for command in commands {
            match command {
                PublicationCommand::ReplaceCandidates(candidates) => {
                    record.publication.match_candidates = candidates;
                }
                PublicationCommand::AppendAudit(entry) => {
                    appended.push((doi.to_string(), entry));
                }
                PublicationCommand::SetDecision(decision) => {
                    record.publication.match_decision = Some(decision);
                }
                PublicationCommand::AddMatchedGrant(grant_id) => {
                    if !record.publication.matched_grants.contains(&grant_id) {
                        record.publication.matched_grants.push(grant_id);
                    }
                }
                PublicationCommand::RemoveCandidate(grant_id) => {
                    record
                        .publication
                        .match_candidates
                        .retain(|c| c.grant_id != grant_id);
                }
                PublicationCommand::SetComplianceScore(score) => {
                    record.publication.compliance_score = score.min(100);
                }
            }
        }
        record.revision += 1;
        debug!(
            "Applied command batch to {} (revision {} -> {})",
            doi,
            expected_revision,
            record.revision
        );
        let updated = record.publication.clone();
        drop(records);

        if !appended.is_empty() {
            let mut audit = self.audit.lock().unwrap();
            audit.extend(appended);
        }
        Ok(updated)
    }

    fn audit_history(&self, doi: &str) -> Vec<AuditEntry> {
        let audit = self.audit.lock().unwrap();
        audit
            .iter()
            .filter(|(id, _)| id == doi)
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}

/// In-memory grant repository.
pub struct MemoryGrantRepo {
    grants: Vec<Grant>,
}

impl MemoryGrantRepo {
    pub fn new(grants: Vec<Grant>) -> Self {
        Self { grants }
    }
}

impl GrantRepo for MemoryGrantRepo {
    fn find_by_grant_id(&self, grant_id: &str) -> Option<Grant> {
        self.grants.iter().find(|g| g.grant_id == grant_id).cloned()
    }

    fn all(&self) -> Vec<Grant> {
        self.grants.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::matching::{AuditAction, MatchMethod};
    use chrono::Utc;
    use uuid::Uuid;

    fn publication(doi: &str) -> Publication {
        serde_json::from_value(serde_json::json!({ "doi": doi })).unwrap()
    }

    fn candidate(grant_id: &str, score: f64) -> MatchCandidate {
        MatchCandidate {
            grant_id: grant_id.to_string(),
            score,
            method: MatchMethod::Composite,
            reasons: vec![],
        }
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("10.1/none").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_revision_conflict_rejects_second_writer() {
        let store = MemoryStore::new();
        store.insert(publication("10.1/a"));
        let first = store.get("10.1/a").unwrap();

        store
            .apply(
                "10.1/a",
                first.revision,
                vec![PublicationCommand::SetComplianceScore(40)],
            )
            .unwrap();

        // A second writer still holding the old revision must lose.
        let err = store
            .apply(
                "10.1/a",
                first.revision,
                vec![PublicationCommand::SetComplianceScore(80)],
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[test]
    fn test_candidate_mutation_requires_audit() {
        let store = MemoryStore::new();
        store.insert(publication("10.1/b"));

        let err = store
            .apply(
                "10.1/b",
                0,
                vec![PublicationCommand::RemoveCandidate("DEL-15-011".into())],
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        // An empty replacement appends nothing and is allowed.
        store
            .apply("10.1/b", 0, vec![PublicationCommand::ReplaceCandidates(vec![])])
            .unwrap();
    }

    #[test]
    fn test_audit_log_survives_candidate_removal() {
        let store = MemoryStore::new();
        store.insert(publication("10.1/c"));
        let c = candidate("DEL-15-011", 0.7);

        store
            .apply(
                "10.1/c",
                0,
                vec![
                    PublicationCommand::ReplaceCandidates(vec![c.clone()]),
                    PublicationCommand::AppendAudit(AuditEntry::auto(&c)),
                ],
            )
            .unwrap();
        let rejected = AuditEntry {
            id: Uuid::new_v4(),
            grant_id: Some(c.grant_id.clone()),
            score: Some(c.score),
            method: c.method,
            recorded_at: Utc::now(),
            actor: "reviewer-1".into(),
            action: AuditAction::Rejected,
            note: String::new(),
        };
        let updated = store
            .apply(
                "10.1/c",
                1,
                vec![
                    PublicationCommand::AppendAudit(rejected),
                    PublicationCommand::RemoveCandidate(c.grant_id.clone()),
                ],
            )
            .unwrap();

        assert!(updated.match_candidates.is_empty());
        let history = store.audit_history("10.1/c");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].action, AuditAction::Rejected);
    }

    #[test]
    fn test_add_matched_grant_deduplicates() {
        let store = MemoryStore::new();
        store.insert(publication("10.1/d"));
        let c = candidate("DEL-15-011", 0.9);

        for revision in 0..2 {
            store
                .apply(
                    "10.1/d",
                    revision,
                    vec![
                        PublicationCommand::AddMatchedGrant("DEL-15-011".into()),
                        PublicationCommand::AppendAudit(AuditEntry::auto(&c)),
                    ],
                )
                .unwrap();
        }
        let updated = store.get("10.1/d").unwrap().doc;
        assert_eq!(updated.matched_grants, vec!["DEL-15-011"]);
    }
}
