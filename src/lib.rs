//! Publication-grant matching and compliance scoring engine.
//!
//! The crate links research publications to the grants that funded them and
//! scores how healthy a publication's metadata and linked resources are.
//! Matching is multi-signal (ORCID identity, acknowledgement text, fuzzy
//! name similarity, institution mentions, funding windows) and every
//! candidate or decision mutation is recorded in an append-only audit log.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod health;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod review;
pub mod storage;
