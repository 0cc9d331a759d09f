use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use grantlink::collaborators::{gather, CollaboratorResults, OfflineCollaborators};
use grantlink::config::MatchThresholds;
use grantlink::matching::engine::MatchingEngine;
use grantlink::matching::name::{annotate_grant, annotate_publication};
use grantlink::models::core::{Grant, Publication, Reviewer};
use grantlink::pipeline::{process_publication, RunReport};
use grantlink::review::suggest::DEFAULT_TOP_N;
use grantlink::storage::{MemoryStore, PublicationStore};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

/// Publication-grant matching and compliance scoring pipeline.
#[derive(Parser, Debug)]
#[command(name = "grantlink", version, about)]
struct Cli {
    /// JSON file with the grant universe.
    #[arg(long)]
    grants: PathBuf,

    /// JSON file with publications to ingest (optionally carrying
    /// pre-resolved collaborator results per publication).
    #[arg(long)]
    publications: PathBuf,

    /// JSON file with reviewer profiles.
    #[arg(long)]
    reviewers: Option<PathBuf>,

    /// Where to write the JSON run report (stdout when omitted).
    #[arg(long)]
    output: Option<PathBuf>,

    /// How many reviewer suggestions to keep per publication.
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,
}

/// One publication fixture: the record itself plus whatever the upstream
/// orchestrator already resolved for it (DOI lookup, link probes). When a
/// fixture carries no results, they are gathered through the offline
/// collaborator seams instead, which report every lookup as failed.
#[derive(Debug, Deserialize)]
struct PublicationFixture {
    #[serde(flatten)]
    publication: Publication,
    #[serde(default)]
    collaborator_results: Option<CollaboratorResults>,
}

fn load_json<T: serde::de::DeserializeOwned>(path: &PathBuf, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {}", what, path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {} file {}", what, path.display()))
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();

    info!("Starting publication-grant matching pipeline");
    let started = Instant::now();
    let started_at = Utc::now();
    let run_id = Uuid::new_v4().to_string();
    info!("Run id: {}", run_id);

    let thresholds = MatchThresholds::from_env();
    thresholds.log_config();

    let mut grants: Vec<Grant> = load_json(&cli.grants, "grants")?;
    for grant in &mut grants {
        annotate_grant(grant);
    }
    info!("Loaded {} grants", grants.len());

    let fixtures: Vec<PublicationFixture> = load_json(&cli.publications, "publications")?;
    info!("Loaded {} publications", fixtures.len());

    let reviewers: Vec<Reviewer> = match &cli.reviewers {
        Some(path) => load_json(path, "reviewers")?,
        None => Vec::new(),
    };
    if reviewers.is_empty() {
        warn!("No reviewer profiles loaded; suggestions will be empty");
    } else {
        info!("Loaded {} reviewers", reviewers.len());
    }

    let store = MemoryStore::new();
    let mut work: Vec<(String, CollaboratorResults)> = Vec::new();
    for fixture in fixtures {
        let mut publication = fixture.publication;
        annotate_publication(&mut publication);
        let collab = fixture.collaborator_results.unwrap_or_else(|| {
            gather(&publication, &OfflineCollaborators, &OfflineCollaborators)
        });
        work.push((publication.doi.clone(), collab));
        store.insert(publication);
    }

    let engine = MatchingEngine::new(thresholds);

    let pb = ProgressBar::new(work.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );

    let mut reports = Vec::new();
    let mut failures = 0usize;
    for (doi, collab) in &work {
        pb.set_message(doi.clone());
        match process_publication(&engine, &store, &grants, &reviewers, collab, doi, cli.top_n) {
            Ok(report) => reports.push(report),
            Err(e) => {
                failures += 1;
                warn!("Failed to process {}: {}", doi, e);
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    let run_report = RunReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        publications: reports,
    };

    let rendered = serde_json::to_string_pretty(&run_report)
        .context("Failed to serialize run report")?;
    match &cli.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Run report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    info!(
        "Pipeline complete: {} processed, {} failed, {:.1?} elapsed",
        run_report.publications.len(),
        failures,
        started.elapsed()
    );
    Ok(())
}
