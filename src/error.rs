// src/error.rs - Core error taxonomy

use std::fmt;
use thiserror::Error;

/// What kind of record a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Publication,
    Candidate,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Publication => "publication",
            EntityKind::Candidate => "candidate",
        };
        f.write_str(s)
    }
}

/// Errors surfaced to callers. Collaborator failures (DOI resolution, link
/// reachability) are never errors here; they degrade the affected check and
/// the computation carries on.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The store refused a conditional update because another writer got
    /// there first. The caller should re-read and decide again.
    #[error("concurrent update conflict on publication {id}")]
    Conflict { id: String },
}

impl CoreError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
