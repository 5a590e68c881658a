//! The component record: one BoM line plus its verification state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Record-level validation failures. These reject a single record at an
/// ingestion or store boundary; the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("component reference cannot be empty")]
    EmptyReference,

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("'{0}' is not a Library:Name reference")]
    MalformedAssetRef(String),

    #[error("'{0}' must be a relative path without '..' segments")]
    InvalidLocalPath(String),
}

/// User-acceptance state of an assigned footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    Verified,
    /// Downloaded or assigned, awaiting explicit review
    Pending,
    #[default]
    Unverified,
}

/// How a component's footprint was obtained. Set once by whichever producer
/// assigns the footprint; the scorer only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootprintProvenance {
    /// Hand-drawn project asset
    Manual,
    /// Accepted from an external parts API
    ApiVerified,
    /// Adopted from a matched catalog part
    CatalogVerified,
    #[default]
    Unknown,
}

/// Independent verification facts about a component's assets. Health is
/// derived from these; they are never collapsed into one another.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentStatus {
    pub datasheet_local_valid: bool,
    pub footprint_found: bool,
    pub footprint_parsed: bool,
    pub footprint_verified: Verification,
    /// Assigned by an external suggestion or search, not yet user-accepted
    pub footprint_from_search: bool,
    pub symbol_lib_found: bool,
    pub symbol_lib_parsed: bool,
    pub symbol_definition_found: bool,
}

/// Computed health score with its explanation trail. Derived state only:
/// recomputed from `ComponentStatus`, never edited directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthScore {
    pub score: f64,
    pub max_possible: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_version: Option<String>,
}

/// One BoM line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Component {
    pub reference: String,
    pub value: String,
    pub description: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet_local: Option<String>,
    pub source_info: String,
    pub footprint_provenance: FootprintProvenance,
    pub status: ComponentStatus,
    pub health: HealthScore,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extracted_params: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_area: Option<f64>,
}

impl Default for Component {
    fn default() -> Self {
        Component {
            reference: String::new(),
            value: String::new(),
            description: String::new(),
            quantity: 1,
            package: None,
            footprint: None,
            symbol: None,
            mpn: None,
            datasheet_url: None,
            datasheet_local: None,
            source_info: "unknown".to_string(),
            footprint_provenance: FootprintProvenance::default(),
            status: ComponentStatus::default(),
            health: HealthScore::default(),
            notes: Vec::new(),
            extracted_params: BTreeMap::new(),
            estimated_area: None,
        }
    }
}

impl Component {
    /// New component with the given reference and value.
    pub fn new(reference: impl Into<String>, value: impl Into<String>) -> Self {
        Component {
            reference: reference.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Validate record invariants: non-empty reference, well-formed
    /// `Library:Name` asset references, portable local datasheet path.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.reference.trim().is_empty() {
            return Err(RecordError::EmptyReference);
        }
        for asset in [&self.footprint, &self.symbol].into_iter().flatten() {
            if !is_asset_ref(asset) {
                return Err(RecordError::MalformedAssetRef(asset.clone()));
            }
        }
        if let Some(path) = &self.datasheet_local {
            validate_local_path(path)?;
        }
        Ok(())
    }

    /// Append a note, skipping exact duplicates.
    pub fn add_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        if !self.notes.contains(&note) {
            self.notes.push(note);
        }
    }
}

/// `Library:Name` with exactly one separator and non-empty halves.
pub(crate) fn is_asset_ref(s: &str) -> bool {
    s.chars().filter(|&c| c == ':').count() == 1
        && s.split_once(':')
            .is_some_and(|(lib, name)| !lib.is_empty() && !name.is_empty())
}

fn validate_local_path(path: &str) -> Result<(), RecordError> {
    let p = Path::new(path);
    if p.is_absolute() || p.components().any(|c| c.as_os_str() == "..") {
        return Err(RecordError::InvalidLocalPath(path.to_string()));
    }
    Ok(())
}
