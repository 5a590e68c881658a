//! Collaborator ports. The core never performs suggestion inference or
//! network access itself; optional providers are injected through these
//! traits, and their absence only degrades the checks that depend on them.

use bomcheck_model::Component;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),
}

/// Outcome of a footprint suggestion. Providers must return `Uncertain`
/// rather than guessing; a suggestion is never authoritative and only ever
/// populates an unverified status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    Suggestion { footprint: String, rationale: String },
    Uncertain,
}

pub trait SuggestionProvider: Send + Sync {
    fn suggest_footprint(&self, component: &Component) -> Result<SuggestionOutcome, PortError>;
}

/// A candidate asset found by a remote parts search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAsset {
    pub identifier: String,
    pub mpn: String,
    /// `Library:Name` reference the asset would install as, when known
    pub footprint_ref: Option<String>,
    pub source: String,
}

/// Remote parts-database access. Downloads land in the staging/review
/// directory, never in a trusted library root; promotion out of staging is
/// an explicit user action outside this core.
pub trait RemotePartsProvider: Send + Sync {
    fn search(&self, mpn: &str) -> Result<Vec<RemoteAsset>, PortError>;
    fn download(&self, asset: &RemoteAsset, staging_dir: &Path) -> Result<PathBuf, PortError>;
}
