// src/models/core.rs - Domain records: grants, publications, authors, reviewers

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::matching::name::normalize_name;
use crate::models::matching::{MatchCandidate, MatchDecision};

/// Canonical representation of a personal name, derived on demand from the
/// raw string. Deterministic: the same input always yields the same output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedName {
    /// Lowercased, diacritic- and punctuation-stripped, titles removed.
    pub canonical: String,
    /// Whitespace tokens of `canonical`, insertion order preserved.
    pub tokens: Vec<String>,
    /// Double Metaphone `primary|alternate` pair; empty when encoding
    /// produced nothing.
    pub phonetic: String,
    /// 3-character windows over each token padded as `__token__`.
    pub trigrams: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub orcid: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
    /// Precomputed normalization, filled in during ingestion. Anything that
    /// needs the canonical form should go through [`Author::canonical_name`]
    /// so a missing annotation degrades to an on-the-fly computation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedName>,
}

impl Author {
    pub fn canonical_name(&self) -> String {
        match &self.normalized {
            Some(n) if !n.canonical.is_empty() => n.canonical.clone(),
            _ => normalize_name(&self.name).canonical,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLink {
    pub url: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

/// A funded grant. Immutable once matching begins, apart from
/// administrative edits (which must re-run [`crate::matching::name::annotate_grant`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    /// Stable business key, e.g. `DEL-15-011`.
    pub grant_id: String,
    #[serde(default)]
    pub programme: Option<String>,
    pub pi_name: String,
    #[serde(default)]
    pub pi_name_canonical: String,
    #[serde(default)]
    pub pi_name_tokens: Vec<String>,
    #[serde(default)]
    pub pi_name_phonetic: String,
    #[serde(default)]
    pub pi_name_trigrams: BTreeSet<String>,
    #[serde(default)]
    pub pi_orcid: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Grant {
    pub fn pi_canonical(&self) -> String {
        if self.pi_name_canonical.is_empty() {
            normalize_name(&self.pi_name).canonical
        } else {
            self.pi_name_canonical.clone()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    /// Unique key for the publication.
    pub doi: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub published_at: Option<NaiveDate>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub acknowledgement_text: Option<String>,
    #[serde(default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data_links: Vec<DataLink>,
    #[serde(default = "default_true")]
    pub is_latest: bool,
    /// Accepted grant links. May hold several grants even though only one
    /// `match_decision` is retained as final.
    #[serde(default)]
    pub matched_grants: Vec<String>,
    /// Current working candidate list. Replaced wholesale on every matching
    /// run; the audit log, not this list, is the history.
    #[serde(default)]
    pub match_candidates: Vec<MatchCandidate>,
    #[serde(default)]
    pub match_decision: Option<MatchDecision>,
    /// Last computed data-health score, 0-100.
    #[serde(default)]
    pub compliance_score: u8,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Busy,
    #[default]
    Unknown,
}

/// Reviewer profile used by the suggestion engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reviewer {
    pub name: String,
    #[serde(default)]
    pub orcid: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Keywords describing specialties (e.g. "genomics", "epidemiology").
    #[serde(default)]
    pub expertise_tokens: Vec<String>,
    /// Short text snippets used to build term-frequency vectors.
    #[serde(default)]
    pub recent_abstracts: Vec<String>,
    #[serde(default)]
    pub availability: Availability,
}
