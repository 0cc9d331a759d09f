// src/models/matching.rs - Candidate, decision and audit record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How a candidate score was produced. Only the composite multi-signal
/// method exists today; the tag is persisted so the audit log stays
/// readable if alternatives are ever added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    #[default]
    Composite,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::Composite => f.write_str("composite"),
        }
    }
}

/// Raw output of scoring one (publication, grant) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    /// Composite score in `[0, 1]`.
    pub score: f64,
    /// Tags for exactly the signals that fired, in evaluation order.
    pub reasons: Vec<String>,
}

/// A scored, not-yet-decided publication-to-grant association. Ephemeral:
/// every matching run replaces the candidate list wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub grant_id: String,
    pub score: f64,
    pub method: MatchMethod,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Auto,
    Accepted,
    Rejected,
    Updated,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditAction::Auto => "auto",
            AuditAction::Accepted => "accepted",
            AuditAction::Rejected => "rejected",
            AuditAction::Updated => "updated",
        };
        f.write_str(s)
    }
}

/// One event in the append-only audit trail. This is the compliance-relevant
/// record: entries are never edited or deleted, a rejected candidate's
/// history outlives the candidate itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// None for events not tied to a specific grant.
    pub grant_id: Option<String>,
    pub score: Option<f64>,
    pub method: MatchMethod,
    pub recorded_at: DateTime<Utc>,
    /// "system" or a user identifier.
    pub actor: String,
    pub action: AuditAction,
    pub note: String,
}

impl AuditEntry {
    /// Entry for an automatically computed candidate.
    pub fn auto(candidate: &MatchCandidate) -> Self {
        Self {
            id: Uuid::new_v4(),
            grant_id: Some(candidate.grant_id.clone()),
            score: Some(candidate.score),
            method: candidate.method,
            recorded_at: Utc::now(),
            actor: "system".to_string(),
            action: AuditAction::Auto,
            note: "automated candidate computed".to_string(),
        }
    }

    /// Entry for a human accept/reject decision on a candidate.
    pub fn decision(
        candidate: &MatchCandidate,
        action: AuditAction,
        actor: &str,
        note: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            grant_id: Some(candidate.grant_id.clone()),
            score: Some(candidate.score),
            method: candidate.method,
            recorded_at: Utc::now(),
            actor: actor.to_string(),
            action,
            note: note.to_string(),
        }
    }
}

/// The authoritative human-confirmed link. At most one per publication; a
/// later accept overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDecision {
    pub grant_id: String,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
}
