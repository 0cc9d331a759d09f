// src/pipeline.rs - Sequential ingestion flow for one publication at a time

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::config::ScoreBand;
use crate::error::Result;
use crate::health::data_health::{compute_data_health, DataHealthReport};
use crate::health::review_checks::{run_auto_checks, AutoCheckReport};
use crate::matching::engine::MatchingEngine;
use crate::models::core::{Grant, Publication, Reviewer};
use crate::models::matching::MatchCandidate;
use crate::review::suggest::{suggest_reviewers, ReviewerSuggestion};
use crate::collaborators::CollaboratorResults;
use crate::storage::{PublicationCommand, PublicationStore};

/// Everything computed for one publication in one ingestion pass.
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub doi: String,
    pub candidates: Vec<MatchCandidate>,
    /// Review band of the strongest candidate, if any survived.
    pub top_band: Option<ScoreBand>,
    pub data_health: DataHealthReport,
    pub auto_checks: AutoCheckReport,
    pub reviewer_suggestions: Vec<ReviewerSuggestion>,
}

/// Aggregated output of a pipeline run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub publications: Vec<IngestReport>,
}

/// Process one publication end to end: match against the grant universe,
/// score data health, run review pre-checks, rank reviewers. The computed
/// compliance score is persisted back onto the record.
///
/// Resolution is deliberately absent here: linking a grant always takes a
/// human decision, whatever the candidate scores are.
pub fn process_publication(
    engine: &MatchingEngine,
    store: &dyn PublicationStore,
    grants: &[Grant],
    reviewers: &[Reviewer],
    collab: &CollaboratorResults,
    doi: &str,
    top_n: usize,
) -> Result<IngestReport> {
    let candidates = engine.compute_candidates(store, doi, grants)?;
    let top_band = candidates
        .first()
        .map(|c| engine.thresholds().band(c.score));

    let versioned = store.get(doi)?;
    let publication = versioned.doc;

    let data_health = compute_data_health(&publication, collab);
    let auto_checks = run_auto_checks(&publication, collab);

    store.apply(
        doi,
        versioned.revision,
        vec![PublicationCommand::SetComplianceScore(
            data_health.score.min(100) as u8,
        )],
    )?;

    let reviewer_suggestions = suggest_reviewers(
        &representative_text(&publication),
        &publication.authors,
        reviewers,
        top_n,
    );

    info!(
        "Processed {}: {} candidates, health {}, {} reviewer suggestions",
        doi,
        candidates.len(),
        data_health.score,
        reviewer_suggestions.len()
    );

    Ok(IngestReport {
        doi: doi.to_string(),
        candidates,
        top_band,
        data_health,
        auto_checks,
        reviewer_suggestions,
    })
}

/// Text the publication is represented by when ranking reviewers.
fn representative_text(publication: &Publication) -> String {
    [
        publication.title.as_str(),
        publication.abstract_text.as_deref().unwrap_or(""),
        publication.description.as_deref().unwrap_or(""),
    ]
    .join(" ")
    .trim()
    .to_string()
}
