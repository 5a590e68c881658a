//! The project BoM store: owns the component list, persists it as YAML,
//! and keeps a reference → position index for lookups.

use crate::component::Component;
use crate::{StoreError, persist};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Persisted form of the project BoM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BomDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Path of the export file the components came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_source: Option<String>,
    pub components: Vec<Component>,
}

/// Store for the project BoM. Exclusively owns its component list.
#[derive(Debug)]
pub struct BomStore {
    path: PathBuf,
    doc: BomDocument,
    index: HashMap<String, usize>,
}

impl BomStore {
    /// Open the store at `path`. A missing or empty file yields an empty
    /// store, not an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc: BomDocument = persist::load(&path)?;
        let mut store = BomStore {
            path,
            doc,
            index: HashMap::new(),
        };
        store.rebuild_index();
        log::debug!(
            "loaded {} components from {}",
            store.doc.components.len(),
            store.path.display()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &BomDocument {
        &self.doc
    }

    pub fn components(&self) -> &[Component] {
        &self.doc.components
    }

    pub fn len(&self) -> usize {
        self.doc.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.components.is_empty()
    }

    /// Replace the entire component list with a fresh ingestion result.
    /// Import is a full reset, not an incremental merge.
    pub fn replace_all(&mut self, components: Vec<Component>, export_source: Option<String>) {
        self.doc.components = components;
        self.doc.export_source = export_source;
        self.rebuild_index();
    }

    /// Look up a component by reference. Uses the position index, with a
    /// linear scan fallback in case the index is stale.
    pub fn get(&self, reference: &str) -> Option<&Component> {
        if let Some(&i) = self.index.get(reference) {
            if let Some(c) = self.doc.components.get(i) {
                if c.reference == reference {
                    return Some(c);
                }
            }
        }
        self.doc.components.iter().find(|c| c.reference == reference)
    }

    /// Add a component. Returns `false` without modifying the store when
    /// the reference already exists.
    pub fn add(&mut self, component: Component) -> bool {
        if self.get(&component.reference).is_some() {
            log::warn!("component '{}' already exists", component.reference);
            return false;
        }
        self.index
            .insert(component.reference.clone(), self.doc.components.len());
        self.doc.components.push(component);
        true
    }

    /// Replace the component with the same reference. Returns `false` when
    /// no such component exists.
    pub fn update(&mut self, component: Component) -> bool {
        let position = match self.index.get(&component.reference) {
            Some(&i)
                if self
                    .doc
                    .components
                    .get(i)
                    .is_some_and(|c| c.reference == component.reference) =>
            {
                Some(i)
            }
            _ => self
                .doc
                .components
                .iter()
                .position(|c| c.reference == component.reference),
        };
        match position {
            Some(i) => {
                self.index.insert(component.reference.clone(), i);
                self.doc.components[i] = component;
                true
            }
            None => {
                log::warn!("component '{}' not found for update", component.reference);
                false
            }
        }
    }

    /// Write the store to disk (parent directory created, atomic replace).
    pub fn save(&self) -> Result<(), StoreError> {
        persist::save(&self.path, &self.doc)?;
        log::debug!(
            "saved {} components to {}",
            self.doc.components.len(),
            self.path.display()
        );
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .doc
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| (c.reference.clone(), i))
            .collect();
    }
}
