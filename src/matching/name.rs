// src/matching/name.rs - Personal-name normalization for matching

use once_cell::sync::Lazy;
use regex::Regex;
use rphonetic::{DoubleMetaphone, Encoder};
use std::collections::BTreeSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::core::{Grant, NormalizedName, Publication};

/// Academic titles stripped as whole tokens, optional trailing period.
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(dr|prof|professor|mr|mrs|ms|miss)\b\.?").unwrap());

/// Normalize a free-text personal name.
///
/// Total function: malformed or empty input yields an all-empty but valid
/// [`NormalizedName`], never an error. Steps, in order: strip academic
/// titles, Unicode NFD fold with combining marks dropped, replace anything
/// that is not a letter/digit/whitespace with a space, lowercase, collapse
/// whitespace, tokenize, encode Double Metaphone over the cleaned string,
/// build per-token trigrams.
pub fn normalize_name(raw: &str) -> NormalizedName {
    if raw.trim().is_empty() {
        return NormalizedName::default();
    }

    let untitled = TITLE_RE.replace_all(raw, " ");

    // Apostrophes are dropped, not split on: O'Brien stays one token.
    let folded: String = untitled
        .nfd()
        .filter(|c| !is_combining_mark(*c) && *c != '\'' && *c != '\u{2019}')
        .flat_map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().collect::<Vec<char>>()
            } else {
                vec![' ']
            }
        })
        .collect();

    let tokens: Vec<String> = folded
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();
    let canonical = tokens.join(" ");

    NormalizedName {
        phonetic: phonetic_code(&canonical),
        trigrams: token_trigrams(&tokens),
        canonical,
        tokens,
    }
}

/// Double Metaphone `primary|alternate` over the cleaned string. Inputs the
/// encoder cannot represent (digits-only, empty) come back as an empty
/// string rather than an error.
fn phonetic_code(canonical: &str) -> String {
    if canonical.is_empty() {
        return String::new();
    }
    let encoder = DoubleMetaphone::default();
    let primary = encoder.encode(canonical);
    let alternate = encoder.encode_alternate(canonical);
    if primary.is_empty() && alternate.is_empty() {
        String::new()
    } else {
        format!("{}|{}", primary, alternate)
    }
}

/// 3-character sliding windows over each token padded as `__token__`.
fn token_trigrams(tokens: &[String]) -> BTreeSet<String> {
    let mut trigrams = BTreeSet::new();
    for token in tokens {
        let padded: Vec<char> = format!("__{}__", token).chars().collect();
        for window in padded.windows(3) {
            trigrams.insert(window.iter().collect());
        }
    }
    trigrams
}

/// Fill in the precomputed normalization fields on a grant's PI name.
pub fn annotate_grant(grant: &mut Grant) {
    let normalized = normalize_name(&grant.pi_name);
    grant.pi_name_canonical = normalized.canonical;
    grant.pi_name_tokens = normalized.tokens;
    grant.pi_name_phonetic = normalized.phonetic;
    grant.pi_name_trigrams = normalized.trigrams;
}

/// Annotate every author that does not already carry a normalization.
pub fn annotate_publication(publication: &mut Publication) {
    for author in &mut publication.authors {
        if author.normalized.is_none() {
            author.normalized = Some(normalize_name(&author.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_and_punctuation_stripped() {
        let n = normalize_name("Dr. Jane A. O'Brien");
        assert_eq!(n.canonical, "jane a obrien");
        assert_eq!(n.tokens, vec!["jane", "a", "obrien"]);
    }

    #[test]
    fn test_diacritics_stripped() {
        let n = normalize_name("José García-Núñez");
        assert_eq!(n.canonical, "jose garcia nunez");
        assert_eq!(n.tokens, vec!["jose", "garcia", "nunez"]);
    }

    #[test]
    fn test_empty_input_yields_empty_but_valid() {
        for raw in ["", "   ", "...", "!!"] {
            let n = normalize_name(raw);
            assert_eq!(n.canonical, "");
            assert!(n.tokens.is_empty());
            assert_eq!(n.phonetic, "");
            assert!(n.trigrams.is_empty());
        }
    }

    #[test]
    fn test_deterministic() {
        let a = normalize_name("Prof. Müller, Hans");
        let b = normalize_name("Prof. Müller, Hans");
        assert_eq!(a, b);
    }

    #[test]
    fn test_phonetic_pair_format() {
        let n = normalize_name("Smith");
        assert!(n.phonetic.contains('|'), "expected primary|alternate pair, got {:?}", n.phonetic);
        assert!(!n.phonetic.starts_with('|'));
    }

    #[test]
    fn test_trigrams_padded_per_token() {
        let n = normalize_name("Liu");
        // __liu__ -> __l, _li, liu, iu_, u__
        let expected: Vec<&str> = vec!["__l", "_li", "iu_", "liu", "u__"];
        let got: Vec<String> = n.trigrams.iter().cloned().collect();
        let mut expected_sorted: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
        expected_sorted.sort();
        assert_eq!(got, expected_sorted);
    }

    #[test]
    fn test_single_character_token() {
        let n = normalize_name("J");
        // __j__ -> __j, _j_, j__
        assert_eq!(n.trigrams.len(), 3);
    }

    #[test]
    fn test_annotate_grant() {
        let mut grant = Grant {
            grant_id: "DEL-15-011".to_string(),
            programme: None,
            pi_name: "Prof. Adaeze Okafor".to_string(),
            pi_name_canonical: String::new(),
            pi_name_tokens: Vec::new(),
            pi_name_phonetic: String::new(),
            pi_name_trigrams: BTreeSet::new(),
            pi_orcid: None,
            institution: None,
            start_date: None,
            end_date: None,
        };
        annotate_grant(&mut grant);
        assert_eq!(grant.pi_name_canonical, "adaeze okafor");
        assert_eq!(grant.pi_name_tokens.len(), 2);
        assert!(!grant.pi_name_trigrams.is_empty());
    }
}
