// src/health/review_checks.rs - Automated pre-checks for the review workflow
//
// A sibling of the data-health scorer with its own keyword sets and no
// weighting: these booleans pre-populate a review form rather than roll up
// into a single score. Kept separate on purpose; the two check sets have
// drifted apart and are tuned independently.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::collaborators::CollaboratorResults;
use crate::health::{find_grant_ids, link_outcomes, LinkOutcome};
use crate::models::core::Publication;

const METHOD_KEYWORDS: [&str; 8] = [
    "method",
    "methods",
    "methodology",
    "materials and methods",
    "protocol",
    "study design",
    "randomiz",
    "experiment",
];

const LOD_KEYWORDS: [&str; 5] = [
    "limit of detection",
    "lod",
    "below detection",
    "above limit",
    "below limit",
];

static STAT_TESTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(t[- ]test|anova|chi[- ]?square|regression|logistic regression|linear regression|mixed model|wilcoxon|kruskal|mann[- ]?whitney|pearson|spearman)\b",
    )
    .unwrap()
});

static CODE_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(github\.com|gitlab\.com|bitbucket\.org|zenodo\.org|figshare\.com|osf\.io)")
        .unwrap()
});

fn contains_keywords(text: &str, keywords: &[&str]) -> bool {
    if text.is_empty() {
        return false;
    }
    let lowered = text.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

/// Boolean check map attached to a review when it is opened.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AutoCheckReport {
    pub doi_exists: bool,
    pub data_links: Vec<LinkOutcome>,
    pub dataset_accessible: bool,
    pub acknowledgement_contains_grant: bool,
    pub found_grant_ids: Vec<String>,
    pub method_section_present: bool,
    pub statistical_tests_named: bool,
    pub code_available: bool,
    pub lod_handling_flagged: bool,
}

/// Run the automated review checks for one publication. Collaborator
/// failures read as check-false; the report is always fully populated.
pub fn run_auto_checks(
    publication: &Publication,
    collab: &CollaboratorResults,
) -> AutoCheckReport {
    let mut report = AutoCheckReport {
        doi_exists: !publication.doi.trim().is_empty(),
        ..Default::default()
    };

    let (outcomes, any_reachable) = link_outcomes(publication, collab);
    report.data_links = outcomes;
    report.dataset_accessible = any_reachable;

    report.found_grant_ids =
        find_grant_ids(publication.acknowledgement_text.as_deref().unwrap_or(""));
    report.acknowledgement_contains_grant = !report.found_grant_ids.is_empty();

    // Abstract, title and acknowledgement; the description field is not
    // consulted here.
    let text = [
        publication.abstract_text.as_deref().unwrap_or(""),
        publication.title.as_str(),
        publication.acknowledgement_text.as_deref().unwrap_or(""),
    ]
    .join(" ");

    report.method_section_present = contains_keywords(&text, &METHOD_KEYWORDS);
    report.statistical_tests_named = STAT_TESTS_RE.is_match(&text);
    report.code_available = CODE_LINK_RE.is_match(&text);
    report.lod_handling_flagged = contains_keywords(&text, &LOD_KEYWORDS);

    report
}
