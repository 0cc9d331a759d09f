// src/health/mod.rs - Heuristic completeness and review pre-checks

pub mod data_health;
pub mod review_checks;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::collaborators::CollaboratorResults;
use crate::models::core::Publication;

/// Grant identifier shape cited in acknowledgements, e.g. `DEL-15-011`.
static GRANT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{2,5}-\d{2,4}-\d{2,4}").unwrap());

/// All grant identifiers found in a text, deduplicated, first-seen order.
pub fn find_grant_ids(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for m in GRANT_ID_RE.find_iter(text) {
        let id = m.as_str().to_string();
        if !found.contains(&id) {
            found.push(id);
        }
    }
    found
}

/// Per-link outcome as reported in health/check output.
#[derive(Debug, Clone, Serialize)]
pub struct LinkOutcome {
    pub url: String,
    pub ok: bool,
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Map every data link of the publication to its collaborator-reported
/// outcome. A link the collaborator never answered for counts as failed.
/// Returns the outcomes plus whether any link was reachable.
pub(crate) fn link_outcomes(
    publication: &Publication,
    collab: &CollaboratorResults,
) -> (Vec<LinkOutcome>, bool) {
    let mut outcomes = Vec::new();
    let mut any_reachable = false;
    for dl in &publication.data_links {
        let outcome = match collab.link_for(&dl.url) {
            Some(check) => LinkOutcome {
                url: dl.url.clone(),
                ok: check.is_reachable(),
                status: check.status,
                error: check.error.clone(),
            },
            None => LinkOutcome {
                url: dl.url.clone(),
                ok: false,
                status: None,
                error: Some("no reachability result".to_string()),
            },
        };
        any_reachable |= outcome.ok;
        outcomes.push(outcome);
    }
    (outcomes, any_reachable)
}
