// src/review/suggest.rs - Reviewer suggestion via term-frequency cosine similarity
//
// In-process bag-of-words ranking, adequate for small reviewer pools. A
// larger pool would move to an index or embeddings.

use log::debug;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::core::{Author, Reviewer};

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ReviewerSuggestion {
    pub name: String,
    pub orcid: Option<String>,
    pub affiliation: Option<String>,
    /// Cosine similarity, rounded to 4 decimal places.
    pub score: f64,
}

/// Bag-of-words term frequencies over lowercased alphanumeric tokens.
fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut freq = HashMap::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        *freq.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
    }
    freq
}

/// Cosine similarity between two term-frequency vectors; 0 when either has
/// zero magnitude.
fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .map(|(term, weight)| weight * b.get(term).copied().unwrap_or(0.0))
        .sum();
    let mag_a: f64 = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let mag_b: f64 = b.values().map(|w| w * w).sum::<f64>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// Conflict of interest: shared ORCID with any author, or the reviewer's
/// affiliation contained (case-insensitive) in any author's affiliation.
fn has_conflict(reviewer: &Reviewer, authors: &[Author]) -> bool {
    if let Some(orcid) = reviewer.orcid.as_deref().filter(|o| !o.is_empty()) {
        if authors.iter().any(|a| a.orcid.as_deref() == Some(orcid)) {
            return true;
        }
    }
    if let Some(affiliation) = reviewer.affiliation.as_deref().filter(|s| !s.is_empty()) {
        let needle = affiliation.to_lowercase();
        if authors.iter().any(|a| {
            a.affiliation
                .as_deref()
                .is_some_and(|aff| aff.to_lowercase().contains(&needle))
        }) {
            return true;
        }
    }
    false
}

/// Text a reviewer is represented by: expertise keywords plus recent
/// abstract snippets, falling back to the bare name.
fn reviewer_text(reviewer: &Reviewer) -> String {
    let mut parts = Vec::new();
    if !reviewer.expertise_tokens.is_empty() {
        parts.push(reviewer.expertise_tokens.join(" "));
    }
    if !reviewer.recent_abstracts.is_empty() {
        parts.push(reviewer.recent_abstracts.join(" "));
    }
    let joined = parts.join(" ");
    if joined.trim().is_empty() {
        reviewer.name.clone()
    } else {
        joined
    }
}

/// Rank reviewers against a publication's representative text (title plus
/// abstract/description), excluding conflicts of interest, descending by
/// similarity, truncated to `top_n`.
pub fn suggest_reviewers(
    publication_text: &str,
    authors: &[Author],
    reviewers: &[Reviewer],
    top_n: usize,
) -> Vec<ReviewerSuggestion> {
    if publication_text.trim().is_empty() || reviewers.is_empty() {
        return Vec::new();
    }

    let publication_vector = term_frequencies(publication_text);
    let mut suggestions: Vec<ReviewerSuggestion> = Vec::new();

    for reviewer in reviewers {
        if has_conflict(reviewer, authors) {
            debug!("Excluding reviewer {} (conflict of interest)", reviewer.name);
            continue;
        }
        let similarity =
            cosine_similarity(&publication_vector, &term_frequencies(&reviewer_text(reviewer)));
        suggestions.push(ReviewerSuggestion {
            name: reviewer.name.clone(),
            orcid: reviewer.orcid.clone(),
            affiliation: reviewer.affiliation.clone(),
            score: (similarity * 10_000.0).round() / 10_000.0,
        });
    }

    suggestions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    suggestions.truncate(top_n);
    suggestions
}
