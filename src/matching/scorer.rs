// src/matching/scorer.rs - Composite scoring of one (publication, grant) pair

use std::collections::HashSet;
use strsim::sorensen_dice;

use crate::models::core::{Grant, Publication};
use crate::models::matching::CandidateScore;

// Signal weights. Additive with partial credit: a signal that cannot be
// evaluated simply does not contribute, the rest still do.
const ORCID_EXACT_WEIGHT: f64 = 0.60;
const ACKNOWLEDGEMENT_WEIGHT: f64 = 0.40;
const NAME_SIMILARITY_WEIGHT: f64 = 0.30;
const INSTITUTION_WEIGHT: f64 = 0.10;
const YEAR_WINDOW_WEIGHT: f64 = 0.05;

/// Token-set similarity: `2 * |intersection| / (|A| + |B|)` over whitespace
/// token sets. Better than a character ratio when name parts are swapped.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let at: HashSet<&str> = a.split_whitespace().collect();
    let bt: HashSet<&str> = b.split_whitespace().collect();
    if at.is_empty() || bt.is_empty() {
        return 0.0;
    }
    let intersection = at.intersection(&bt).count();
    (2.0 * intersection as f64) / ((at.len() + bt.len()) as f64)
}

/// Score a single grant against a publication.
///
/// Five independent signals evaluated in a fixed order, each adding its
/// weight when its precondition holds; the sum is capped at 1.0. The
/// reasons list records exactly the signals that fired, in evaluation
/// order, which candidate sorting relies on being stable.
pub fn score_candidate(publication: &Publication, grant: &Grant) -> CandidateScore {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    // 1) ORCID exact identity between the grant PI and any author.
    if let Some(pi_orcid) = grant.pi_orcid.as_deref().filter(|o| !o.is_empty()) {
        let hit = publication
            .authors
            .iter()
            .any(|a| a.orcid.as_deref() == Some(pi_orcid));
        if hit {
            score += ORCID_EXACT_WEIGHT;
            reasons.push("orcid-exact".to_string());
        }
    }

    let acknowledgement = publication
        .acknowledgement_text
        .as_deref()
        .unwrap_or("")
        .to_lowercase();

    // 2) Acknowledgement cites the grant identifier verbatim.
    if !acknowledgement.is_empty()
        && !grant.grant_id.is_empty()
        && acknowledgement.contains(&grant.grant_id.to_lowercase())
    {
        score += ACKNOWLEDGEMENT_WEIGHT;
        reasons.push("acknowledgement-grantId".to_string());
    }

    // 3) Fuzzy name similarity, first author vs the PI.
    let first_author = publication
        .authors
        .first()
        .map(|a| a.canonical_name())
        .unwrap_or_default();
    let pi = grant.pi_canonical();
    if !first_author.is_empty() && !pi.is_empty() {
        let char_ratio = sorensen_dice(&first_author, &pi);
        let token_ratio = token_set_ratio(&first_author, &pi);
        let similarity = char_ratio.max(token_ratio);
        score += NAME_SIMILARITY_WEIGHT * similarity;
        reasons.push(format!("name-sim:{:.3}", similarity));
    }

    // 4) Grant institution mentioned in the acknowledgement.
    if let Some(institution) = grant.institution.as_deref().filter(|i| !i.is_empty()) {
        if !acknowledgement.is_empty() && acknowledgement.contains(&institution.to_lowercase()) {
            score += INSTITUTION_WEIGHT;
            reasons.push("institution-ack".to_string());
        }
    }

    // 5) Publication year inside the funding window, inclusive.
    if let (Some(published), Some(start), Some(end)) =
        (publication.published_at, grant.start_date, grant.end_date)
    {
        use chrono::Datelike;
        let year = published.year();
        if year >= start.year() && year <= end.year() {
            score += YEAR_WINDOW_WEIGHT;
            reasons.push("year-window".to_string());
        }
    }

    CandidateScore {
        score: score.min(1.0),
        reasons,
    }
}
