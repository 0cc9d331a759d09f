// src/matching/engine.rs - Candidate computation over the grant universe

use log::{debug, info};
use std::cmp::Ordering;

use crate::config::MatchThresholds;
use crate::error::Result;
use crate::matching::scorer::score_candidate;
use crate::models::core::Grant;
use crate::models::matching::{AuditEntry, MatchCandidate, MatchMethod};
use crate::storage::{PublicationCommand, PublicationStore};

/// Scores a publication against every grant and persists the surviving
/// candidates. The grant universe is assumed small enough for an exhaustive
/// scan; there is no index.
pub struct MatchingEngine {
    thresholds: MatchThresholds,
}

impl MatchingEngine {
    pub fn new(thresholds: MatchThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &MatchThresholds {
        &self.thresholds
    }

    /// Compute and persist match candidates for one publication.
    ///
    /// Replaces the previous candidate list wholesale and appends one `auto`
    /// audit entry per surviving candidate, in a single atomic command
    /// batch. Re-running with unchanged inputs reproduces the same candidate
    /// list but always adds fresh audit entries: the log records every run.
    /// A missing publication is a caller-visible error; a grant that cannot
    /// be scored on some signal just contributes less.
    pub fn compute_candidates(
        &self,
        store: &dyn PublicationStore,
        doi: &str,
        grants: &[Grant],
    ) -> Result<Vec<MatchCandidate>> {
        let versioned = store.get(doi)?;
        let publication = versioned.doc;

        let mut candidates: Vec<MatchCandidate> = Vec::new();
        for grant in grants {
            let scored = score_candidate(&publication, grant);
            debug!(
                "Scored {} vs {}: {:.3} ({:?})",
                doi, grant.grant_id, scored.score, scored.reasons
            );
            if scored.score >= self.thresholds.ambiguous_min {
                candidates.push(MatchCandidate {
                    grant_id: grant.grant_id.clone(),
                    score: scored.score,
                    method: MatchMethod::Composite,
                    reasons: scored.reasons,
                });
            }
        }

        // Stable sort: ties keep grant iteration order.
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let mut commands = vec![PublicationCommand::ReplaceCandidates(candidates.clone())];
        for candidate in &candidates {
            commands.push(PublicationCommand::AppendAudit(AuditEntry::auto(candidate)));
        }
        store.apply(doi, versioned.revision, commands)?;

        info!(
            "Matched {}: {} of {} grants kept (threshold {:.2})",
            doi,
            candidates.len(),
            grants.len(),
            self.thresholds.ambiguous_min
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::models::core::Publication;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn grant(grant_id: &str, pi_orcid: Option<&str>) -> Grant {
        Grant {
            grant_id: grant_id.to_string(),
            programme: None,
            pi_name: "Jane O'Brien".to_string(),
            pi_name_canonical: String::new(),
            pi_name_tokens: Vec::new(),
            pi_name_phonetic: String::new(),
            pi_name_trigrams: BTreeSet::new(),
            pi_orcid: pi_orcid.map(|s| s.to_string()),
            institution: None,
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2019, 12, 31),
        }
    }

    fn publication() -> Publication {
        serde_json::from_value(serde_json::json!({
            "doi": "10.1000/demo.1",
            "authors": [{ "name": "Jane O'Brien", "orcid": "0000-0002-1825-0097" }],
            "acknowledgement_text": "Supported by grant DEL-15-011.",
            "published_at": "2017-06-01"
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_publication_is_fatal() {
        let store = MemoryStore::new();
        let engine = MatchingEngine::new(MatchThresholds::default());
        let err = engine
            .compute_candidates(&store, "10.1/missing", &[])
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_threshold_filter_sort_and_audit() {
        let store = MemoryStore::new();
        store.insert(publication());
        let engine = MatchingEngine::new(MatchThresholds::default());

        let grants = vec![
            // Name similarity only: below the floor, dropped.
            grant("XYZ-99-999", None),
            // ORCID + name + year: strongest.
            grant("ABC-16-001", Some("0000-0002-1825-0097")),
            // Acknowledgement + name + year: kept, weaker.
            grant("DEL-15-011", None),
        ];

        let candidates = engine
            .compute_candidates(&store, "10.1000/demo.1", &grants)
            .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].grant_id, "ABC-16-001");
        assert_eq!(candidates[1].grant_id, "DEL-15-011");
        assert!(candidates.iter().all(|c| c.score >= 0.55));
        assert!(candidates[0].score > candidates[1].score);

        let stored = store.get("10.1000/demo.1").unwrap().doc;
        assert_eq!(stored.match_candidates, candidates);

        // Exactly one audit entry per surviving candidate.
        let history = store.audit_history("10.1000/demo.1");
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|e| e.actor == "system"));
    }

    #[test]
    fn test_ties_keep_grant_input_order() {
        let store = MemoryStore::new();
        store.insert(publication());
        let engine = MatchingEngine::new(MatchThresholds::default());

        // Two grants with identical scoring profiles tie exactly.
        let grants = vec![
            grant("TIE-17-001", Some("0000-0002-1825-0097")),
            grant("TIE-17-002", Some("0000-0002-1825-0097")),
        ];
        let candidates = engine
            .compute_candidates(&store, "10.1000/demo.1", &grants)
            .unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].grant_id, "TIE-17-001");
        assert_eq!(candidates[1].grant_id, "TIE-17-002");
    }

    #[test]
    fn test_rerun_replaces_candidates_but_appends_audit() {
        let store = MemoryStore::new();
        store.insert(publication());
        let engine = MatchingEngine::new(MatchThresholds::default());
        let grants = vec![grant("DEL-15-011", None)];

        let first = engine
            .compute_candidates(&store, "10.1000/demo.1", &grants)
            .unwrap();
        let second = engine
            .compute_candidates(&store, "10.1000/demo.1", &grants)
            .unwrap();

        assert_eq!(first, second);
        let stored = store.get("10.1000/demo.1").unwrap().doc;
        assert_eq!(stored.match_candidates.len(), 1);
        // Two runs, one candidate each: two audit entries.
        assert_eq!(store.audit_history("10.1000/demo.1").len(), 2);
    }
}
