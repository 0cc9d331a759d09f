// src/matching/resolution.rs - Human accept/reject workflow over candidates

use chrono::Utc;
use log::info;
use std::str::FromStr;

use crate::error::{CoreError, EntityKind, Result};
use crate::models::core::Publication;
use crate::models::matching::{AuditAction, AuditEntry, MatchDecision};
use crate::storage::{GrantRepo, PublicationCommand, PublicationStore};

/// A reviewer's verdict on one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl FromStr for Decision {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accept" => Ok(Decision::Accept),
            "reject" => Ok(Decision::Reject),
            other => Err(CoreError::InvalidInput(format!(
                "decision must be 'accept' or 'reject', got '{}'",
                other
            ))),
        }
    }
}

/// Apply a human decision to one candidate of a publication.
///
/// The candidate must be in the current working list, otherwise the call
/// fails with `NotFound`. The loser of a concurrent resolve observes the
/// same error after the winner removed the candidate.
///
/// Accept records the grant link (when the grant still exists in the repo),
/// overwrites the final decision and appends an `accepted` audit entry; the
/// candidate stays listed. Reject appends a `rejected` audit entry and
/// removes the candidate; its audit history remains. Neither transition is
/// idempotent: every call appends a fresh entry.
pub fn resolve_candidate(
    store: &dyn PublicationStore,
    grants: &dyn GrantRepo,
    doi: &str,
    grant_id: &str,
    decision: Decision,
    actor: &str,
    note: &str,
) -> Result<Publication> {
    let versioned = store.get(doi)?;
    let publication = versioned.doc;

    let candidate = publication
        .match_candidates
        .iter()
        .find(|c| c.grant_id == grant_id)
        .cloned()
        .ok_or_else(|| CoreError::not_found(EntityKind::Candidate, grant_id))?;

    let mut commands = Vec::new();
    match decision {
        Decision::Accept => {
            if grants.find_by_grant_id(grant_id).is_some()
                && !publication.matched_grants.iter().any(|g| g == grant_id)
            {
                commands.push(PublicationCommand::AddMatchedGrant(grant_id.to_string()));
            }
            commands.push(PublicationCommand::SetDecision(MatchDecision {
                grant_id: grant_id.to_string(),
                decided_by: actor.to_string(),
                decided_at: Utc::now(),
            }));
            commands.push(PublicationCommand::AppendAudit(AuditEntry::decision(
                &candidate,
                AuditAction::Accepted,
                actor,
                note,
            )));
        }
        Decision::Reject => {
            commands.push(PublicationCommand::AppendAudit(AuditEntry::decision(
                &candidate,
                AuditAction::Rejected,
                actor,
                note,
            )));
            commands.push(PublicationCommand::RemoveCandidate(grant_id.to_string()));
        }
    }

    let updated = store.apply(doi, versioned.revision, commands)?;
    info!(
        "Resolved candidate {} on {} as {:?} by {}",
        grant_id, doi, decision, actor
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchThresholds;
    use crate::matching::engine::MatchingEngine;
    use crate::models::core::Grant;
    use crate::storage::{MemoryGrantRepo, MemoryStore};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn grant(grant_id: &str) -> Grant {
        Grant {
            grant_id: grant_id.to_string(),
            programme: None,
            pi_name: "Jane O'Brien".to_string(),
            pi_name_canonical: String::new(),
            pi_name_tokens: Vec::new(),
            pi_name_phonetic: String::new(),
            pi_name_trigrams: BTreeSet::new(),
            pi_orcid: Some("0000-0002-1825-0097".to_string()),
            institution: None,
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2019, 12, 31),
        }
    }

    /// Store with two candidates already computed for `10.1000/demo.1`.
    fn setup() -> (MemoryStore, MemoryGrantRepo) {
        let store = MemoryStore::new();
        store.insert(
            serde_json::from_value(serde_json::json!({
                "doi": "10.1000/demo.1",
                "authors": [{ "name": "Jane O'Brien", "orcid": "0000-0002-1825-0097" }],
                "published_at": "2017-06-01"
            }))
            .unwrap(),
        );
        let grants = vec![grant("ABC-16-001"), grant("DEL-15-011")];
        let engine = MatchingEngine::new(MatchThresholds::default());
        engine
            .compute_candidates(&store, "10.1000/demo.1", &grants)
            .unwrap();
        (store, MemoryGrantRepo::new(grants))
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!("accept".parse::<Decision>().unwrap(), Decision::Accept);
        assert_eq!("reject".parse::<Decision>().unwrap(), Decision::Reject);
        assert!(matches!(
            "maybe".parse::<Decision>().unwrap_err(),
            CoreError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_unknown_candidate_is_not_found() {
        let (store, grants) = setup();
        let err = resolve_candidate(
            &store,
            &grants,
            "10.1000/demo.1",
            "ZZZ-00-000",
            Decision::Accept,
            "reviewer-1",
            "",
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_accept_links_and_keeps_candidate() {
        let (store, grants) = setup();
        let updated = resolve_candidate(
            &store,
            &grants,
            "10.1000/demo.1",
            "ABC-16-001",
            Decision::Accept,
            "reviewer-1",
            "confirmed by PI email",
        )
        .unwrap();

        assert_eq!(updated.matched_grants, vec!["ABC-16-001"]);
        let decision = updated.match_decision.unwrap();
        assert_eq!(decision.grant_id, "ABC-16-001");
        assert_eq!(decision.decided_by, "reviewer-1");
        // Accept does not remove the candidate from the working list.
        assert!(updated
            .match_candidates
            .iter()
            .any(|c| c.grant_id == "ABC-16-001"));

        let history = store.audit_history("10.1000/demo.1");
        let accepted = history
            .iter()
            .find(|e| e.action == AuditAction::Accepted)
            .unwrap();
        assert_eq!(accepted.note, "confirmed by PI email");
    }

    #[test]
    fn test_second_accept_overwrites_decision_keeps_both_links() {
        let (store, grants) = setup();
        resolve_candidate(
            &store,
            &grants,
            "10.1000/demo.1",
            "ABC-16-001",
            Decision::Accept,
            "reviewer-1",
            "",
        )
        .unwrap();
        let updated = resolve_candidate(
            &store,
            &grants,
            "10.1000/demo.1",
            "DEL-15-011",
            Decision::Accept,
            "reviewer-2",
            "",
        )
        .unwrap();

        assert_eq!(updated.matched_grants, vec!["ABC-16-001", "DEL-15-011"]);
        assert_eq!(updated.match_decision.unwrap().grant_id, "DEL-15-011");

        let history = store.audit_history("10.1000/demo.1");
        let accepted: Vec<_> = history
            .iter()
            .filter(|e| e.action == AuditAction::Accepted)
            .collect();
        assert_eq!(accepted.len(), 2);
    }

    #[test]
    fn test_reject_removes_candidate_audit_survives() {
        let (store, grants) = setup();
        let updated = resolve_candidate(
            &store,
            &grants,
            "10.1000/demo.1",
            "DEL-15-011",
            Decision::Reject,
            "reviewer-1",
            "wrong PI",
        )
        .unwrap();

        assert!(!updated
            .match_candidates
            .iter()
            .any(|c| c.grant_id == "DEL-15-011"));

        let history = store.audit_history("10.1000/demo.1");
        let rejected = history
            .iter()
            .find(|e| e.action == AuditAction::Rejected)
            .unwrap();
        assert_eq!(rejected.grant_id.as_deref(), Some("DEL-15-011"));
        assert_eq!(rejected.note, "wrong PI");

        // A second reject of the same candidate observes NotFound.
        let err = resolve_candidate(
            &store,
            &grants,
            "10.1000/demo.1",
            "DEL-15-011",
            Decision::Reject,
            "reviewer-2",
            "",
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
