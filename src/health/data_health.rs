// src/health/data_health.rs - Weighted data-health scoring for a publication

use chrono::{DateTime, Utc};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::collaborators::{CollaboratorResults, DoiResolution};
use crate::health::{find_grant_ids, link_outcomes, LinkOutcome};
use crate::models::core::Publication;

// Check weights. They sum to 100; the final score is clamped anyway.
const DOI_WEIGHT: u32 = 10;
const DATA_LINK_WEIGHT: u32 = 15;
const GRANT_ACK_WEIGHT: u32 = 20;
const ORCID_WEIGHT: u32 = 10;
const AFFILIATION_WEIGHT: u32 = 10;
const METHODS_WEIGHT: u32 = 15;
const LATEST_VERSION_WEIGHT: u32 = 10;
const LOD_WEIGHT: u32 = 10;

static METHODS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(method|methods|study design|sample size|participants|protocol|cohort|trial)")
        .unwrap()
});
static SAMPLE_SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(n ?=|sample size|participants|cohort of)").unwrap());
static LOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(limit of detection|limit of quantification|\blod\b|\bloq\b|below detection|below limit)",
    )
    .unwrap()
});

/// Raw per-check results, kept alongside the score for report rendering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DataHealthChecks {
    pub doi_resolved: bool,
    pub data_links: Vec<LinkOutcome>,
    pub found_grant_ids: Vec<String>,
    pub has_orcid: bool,
    pub all_authors_have_affiliation: bool,
    pub methods_present: bool,
    pub sample_size_present: bool,
    pub is_latest: bool,
    pub lod_mentioned: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataHealthReport {
    /// Clamped to 0-100.
    pub score: u32,
    /// Named deficiency tags, in check order.
    pub issues: Vec<String>,
    pub checks: DataHealthChecks,
    pub computed_at: DateTime<Utc>,
}

/// Compute the data-health score for a publication.
///
/// Eight independent additive checks; each failure appends a named issue
/// instead of aborting, so one unreachable collaborator never blocks the
/// rest. The result is always fully populated.
pub fn compute_data_health(
    publication: &Publication,
    collab: &CollaboratorResults,
) -> DataHealthReport {
    let mut score: u32 = 0;
    let mut issues: Vec<String> = Vec::new();
    let mut checks = DataHealthChecks::default();

    // 1) DOI resolves via the external lookup.
    if publication.doi.trim().is_empty() {
        issues.push("no-doi".to_string());
    } else {
        match &collab.doi {
            DoiResolution::Resolved { metadata } if !metadata.doi.is_empty() => {
                checks.doi_resolved = true;
                score += DOI_WEIGHT;
            }
            DoiResolution::Resolved { .. } | DoiResolution::Unresolved => {
                issues.push("doi-not-resolved".to_string());
            }
            DoiResolution::Failed { .. } => {
                issues.push("doi-check-failed".to_string());
            }
        }
    }

    // 2) At least one data link reachable.
    let (outcomes, any_reachable) = link_outcomes(publication, collab);
    checks.data_links = outcomes;
    if any_reachable {
        score += DATA_LINK_WEIGHT;
    } else {
        issues.push("data-link-unreachable".to_string());
    }

    // 3) Acknowledgement cites at least one grant identifier.
    checks.found_grant_ids =
        find_grant_ids(publication.acknowledgement_text.as_deref().unwrap_or(""));
    if !checks.found_grant_ids.is_empty() {
        score += GRANT_ACK_WEIGHT;
    } else {
        issues.push("no-grant-acknowledgement".to_string());
    }

    // 4) At least one author carries an ORCID.
    checks.has_orcid = publication
        .authors
        .iter()
        .any(|a| a.orcid.as_deref().is_some_and(|o| !o.is_empty()));
    if checks.has_orcid {
        score += ORCID_WEIGHT;
    } else {
        issues.push("no-orcid".to_string());
    }

    // 5) Every author (and there must be at least one) has an affiliation.
    checks.all_authors_have_affiliation = !publication.authors.is_empty()
        && publication
            .authors
            .iter()
            .all(|a| a.affiliation.as_deref().is_some_and(|s| !s.is_empty()));
    if checks.all_authors_have_affiliation {
        score += AFFILIATION_WEIGHT;
    } else {
        issues.push("missing-author-affiliation".to_string());
    }

    // 6) Methods keywords and a sample-size pattern both present.
    let text = search_text(publication);
    checks.methods_present = METHODS_RE.is_match(&text);
    checks.sample_size_present = SAMPLE_SIZE_RE.is_match(&text);
    if checks.methods_present && checks.sample_size_present {
        score += METHODS_WEIGHT;
    } else {
        issues.push("missing-methods-or-sample-size".to_string());
    }

    // 7) Latest version. Optimistic: true unless upstream metadata or the
    // record itself says a newer version supersedes this one.
    checks.is_latest =
        publication.is_latest && collab.superseded_by_newer_version != Some(true);
    if checks.is_latest {
        score += LATEST_VERSION_WEIGHT;
    } else {
        issues.push("not-latest-version".to_string());
    }

    // 8) Limit-of-detection / quantification handling mentioned.
    checks.lod_mentioned = LOD_RE.is_match(&text);
    if checks.lod_mentioned {
        score += LOD_WEIGHT;
    } else {
        issues.push("lod-not-mentioned".to_string());
    }

    let report = DataHealthReport {
        score: score.min(100),
        issues,
        checks,
        computed_at: Utc::now(),
    };
    debug!(
        "Data health for {}: score={} issues={:?}",
        publication.doi, report.score, report.issues
    );
    report
}

/// Free text searched by the keyword checks: abstract, description, title
/// and acknowledgement concatenated.
fn search_text(publication: &Publication) -> String {
    [
        publication.abstract_text.as_deref().unwrap_or(""),
        publication.description.as_deref().unwrap_or(""),
        publication.title.as_str(),
        publication.acknowledgement_text.as_deref().unwrap_or(""),
    ]
    .join(" ")
}
