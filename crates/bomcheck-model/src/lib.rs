//! Canonical data model for the BoM verification pipeline: components with
//! their verification status, the project BoM store, the parts catalog
//! store, and the exact-field catalog matcher.

pub mod bom;
pub mod catalog;
pub mod component;
pub mod matcher;
mod persist;

pub use bom::{BomDocument, BomStore};
pub use catalog::{CatalogItem, CatalogStore, FootprintSource, PART_ID_PREFIX};
pub use component::{
    Component, ComponentStatus, FootprintProvenance, HealthScore, RecordError, Verification,
};
pub use matcher::MatchQuery;

use thiserror::Error;

/// Persistence failures. Duplicate keys and missing keys are not errors;
/// they are `false`-returning no-ops on the store APIs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
