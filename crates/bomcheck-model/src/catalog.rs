//! The parts catalog store: project-independent, physically-available parts
//! with verified footprints.

use crate::component::{RecordError, is_asset_ref};
use crate::{StoreError, persist};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixed prefix for generated catalog part ids (`CAT001`, `CAT002`, ...).
pub const PART_ID_PREFIX: &str = "CAT";

/// How a catalog part's footprint was verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootprintSource {
    Manual,
    ApiVerified,
    CatalogIngestVerified,
    #[default]
    Unknown,
}

/// One catalog entry. The footprint is required: parts enter the catalog
/// only once their footprint has been verified.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogItem {
    pub part_id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub footprint: String,
    pub footprint_source: FootprintSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpn: Option<String>,
    pub quantity_on_hand: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet_local: Option<String>,
}

impl CatalogItem {
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.part_id.trim().is_empty() {
            return Err(RecordError::EmptyField("part_id"));
        }
        if self.description.trim().is_empty() {
            return Err(RecordError::EmptyField("description"));
        }
        if !is_asset_ref(&self.footprint) {
            return Err(RecordError::MalformedAssetRef(self.footprint.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDocument {
    pub parts: Vec<CatalogItem>,
}

/// Store for the parts catalog. Exclusively owns its item list.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    doc: CatalogDocument,
}

impl CatalogStore {
    /// Open the store at `path`. Missing or empty file → empty catalog.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc: CatalogDocument = persist::load(&path)?;
        log::debug!("loaded {} catalog parts from {}", doc.parts.len(), path.display());
        Ok(CatalogStore { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parts(&self) -> &[CatalogItem] {
        &self.doc.parts
    }

    pub fn len(&self) -> usize {
        self.doc.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.parts.is_empty()
    }

    pub fn get(&self, part_id: &str) -> Option<&CatalogItem> {
        self.doc.parts.iter().find(|p| p.part_id == part_id)
    }

    /// Add a part. Returns `false` without modifying the store when the
    /// part id already exists.
    pub fn add(&mut self, part: CatalogItem) -> bool {
        if self.get(&part.part_id).is_some() {
            log::warn!("catalog part '{}' already exists", part.part_id);
            return false;
        }
        self.doc.parts.push(part);
        true
    }

    /// Replace the part with the same id. Returns `false` when absent.
    pub fn update(&mut self, part: CatalogItem) -> bool {
        match self.doc.parts.iter().position(|p| p.part_id == part.part_id) {
            Some(i) => {
                self.doc.parts[i] = part;
                true
            }
            None => {
                log::warn!("catalog part '{}' not found for update", part.part_id);
                false
            }
        }
    }

    pub fn save(&self) -> Result<(), StoreError> {
        persist::save(&self.path, &self.doc)?;
        log::debug!(
            "saved {} catalog parts to {}",
            self.doc.parts.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Allocate the next sequential part id: max existing numeric suffix
    /// plus one, `CAT001` for an empty catalog. Ids that do not follow the
    /// `CATnnn` shape are ignored for allocation.
    pub fn next_part_id(&self) -> String {
        let max = self
            .doc
            .parts
            .iter()
            .filter_map(|p| p.part_id.strip_prefix(PART_ID_PREFIX))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("{PART_ID_PREFIX}{:03}", max + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn part(id: &str, mpn: Option<&str>) -> CatalogItem {
        CatalogItem {
            part_id: id.to_string(),
            description: "Chip resistor".to_string(),
            value: Some("10k".to_string()),
            package: Some("0805".to_string()),
            footprint: "Resistor_SMD:R_0805_2012Metric".to_string(),
            footprint_source: FootprintSource::Manual,
            mpn: mpn.map(str::to_string),
            quantity_on_hand: 40,
            storage_location: Some("Bin A3".to_string()),
            datasheet_local: None,
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.yaml");
        let mut store = CatalogStore::open(&path).unwrap();
        let p = part("CAT001", Some("RC0805FR-0710KL"));
        assert!(store.add(p.clone()));
        store.save().unwrap();

        let reloaded = CatalogStore::open(&path).unwrap();
        assert_eq!(reloaded.get("CAT001"), Some(&p));
    }

    #[test]
    fn test_duplicate_part_id_refused() {
        let dir = TempDir::new().unwrap();
        let mut store = CatalogStore::open(dir.path().join("catalog.yaml")).unwrap();
        assert!(store.add(part("CAT001", None)));
        assert!(!store.add(part("CAT001", None)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_next_part_id() {
        let dir = TempDir::new().unwrap();
        let mut store = CatalogStore::open(dir.path().join("catalog.yaml")).unwrap();
        assert_eq!(store.next_part_id(), "CAT001");

        store.add(part("CAT001", None));
        store.add(part("CAT007", None));
        // non-standard id ignored for allocation
        store.add(part("LEGACY-3", None));
        assert_eq!(store.next_part_id(), "CAT008");
    }

    #[test]
    fn test_validate() {
        assert!(part("CAT001", None).validate().is_ok());

        let mut bad = part("CAT002", None);
        bad.footprint = "no_separator".to_string();
        assert!(bad.validate().is_err());

        let mut empty = part("", None);
        empty.part_id = "".to_string();
        assert!(empty.validate().is_err());
    }
}
