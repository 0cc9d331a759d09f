// src/collaborators.rs - Already-resolved results from external services
//
// DOI resolution and link reachability are network concerns owned by the
// surrounding orchestrator. The scorers only ever see the result shapes
// below; an absent or failed result downgrades the affected check and never
// aborts the rest of a computation.

use serde::{Deserialize, Serialize};

use crate::models::core::Publication;

/// Minimal metadata returned by a successful DOI lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoiMetadata {
    pub doi: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Outcome of asking the resolver about a publication's DOI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum DoiResolution {
    Resolved { metadata: DoiMetadata },
    /// The resolver answered but knows nothing about this DOI.
    Unresolved,
    /// The resolver call itself failed or timed out.
    Failed { reason: String },
}

impl Default for DoiResolution {
    fn default() -> Self {
        DoiResolution::Failed {
            reason: "doi lookup not performed".to_string(),
        }
    }
}

/// Outcome of probing one data link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCheck {
    pub url: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LinkCheck {
    pub fn is_reachable(&self) -> bool {
        self.status == Some(200)
    }

    pub fn failed(url: &str, reason: &str) -> Self {
        Self {
            url: url.to_string(),
            status: None,
            last_modified: None,
            error: Some(reason.to_string()),
        }
    }
}

/// Everything the health scorers need from the outside world, gathered
/// before scoring starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollaboratorResults {
    #[serde(default)]
    pub doi: DoiResolution,
    #[serde(default)]
    pub links: Vec<LinkCheck>,
    /// Explicit superseding-version marker from upstream metadata. `None`
    /// reads as "no evidence of a newer version".
    #[serde(default)]
    pub superseded_by_newer_version: Option<bool>,
}

impl CollaboratorResults {
    pub fn link_for(&self, url: &str) -> Option<&LinkCheck> {
        self.links.iter().find(|l| l.url == url)
    }
}

/// Injectable DOI lookup seam.
pub trait DoiResolver {
    fn resolve(&self, doi: &str) -> DoiResolution;
}

/// Injectable link reachability seam.
pub trait LinkChecker {
    fn check(&self, url: &str) -> LinkCheck;
}

/// Collect collaborator results for one publication through the injected
/// service seams.
pub fn gather(
    publication: &Publication,
    resolver: &dyn DoiResolver,
    checker: &dyn LinkChecker,
) -> CollaboratorResults {
    let doi = if publication.doi.trim().is_empty() {
        DoiResolution::Unresolved
    } else {
        resolver.resolve(&publication.doi)
    };
    let links = publication
        .data_links
        .iter()
        .map(|dl| checker.check(&dl.url))
        .collect();
    CollaboratorResults {
        doi,
        links,
        superseded_by_newer_version: None,
    }
}

/// Offline stand-in used when no collaborator data is available: every
/// lookup reports failure, which the scorers degrade to the matching issue.
pub struct OfflineCollaborators;

impl DoiResolver for OfflineCollaborators {
    fn resolve(&self, _doi: &str) -> DoiResolution {
        DoiResolution::default()
    }
}

impl LinkChecker for OfflineCollaborators {
    fn check(&self, url: &str) -> LinkCheck {
        LinkCheck::failed(url, "link check not performed")
    }
}
