//! Ingestion of KiCad BoM exports into component records.
//!
//! Two input shapes are supported: delimited tabular exports (`.csv`) and
//! the XML netlist export (`.xml`). Ingestion has partial-success
//! semantics: bad rows are skipped with a warning, never aborting the rest
//! of the file.

pub mod netlist;
pub mod tabular;

pub use netlist::parse_netlist;
pub use tabular::parse_tabular;

use bomcheck_model::{Component, RecordError};
use std::path::Path;
use thiserror::Error;

/// Whole-file ingestion failures. Per-row problems never surface here;
/// they land in [`IngestReport::warnings`].
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("missing required element: <{0}>")]
    MissingElement(&'static str),

    #[error("unsupported export format '{0}' (expected .csv or .xml)")]
    UnsupportedFormat(String),
}

/// Result of one ingestion run: validated components in input order, plus
/// the rows that had to be skipped and why.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub components: Vec<Component>,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl IngestReport {
    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.warnings.push(message);
    }

    fn skip(&mut self, message: impl Into<String>) {
        self.skipped += 1;
        self.warn(message);
    }

    /// Validate a freshly built record. Field-level problems (malformed
    /// asset reference, non-portable datasheet path) drop the offending
    /// field and keep the record; an unusable or duplicate reference
    /// rejects it.
    fn push_validated(&mut self, mut component: Component) {
        if self
            .components
            .iter()
            .any(|c| c.reference == component.reference)
        {
            self.skip(format!(
                "skipping duplicate reference '{}'",
                component.reference
            ));
            return;
        }
        loop {
            match component.validate() {
                Ok(()) => {
                    self.components.push(component);
                    return;
                }
                Err(RecordError::MalformedAssetRef(ref asset)) => {
                    self.warn(format!(
                        "{}: dropping malformed asset reference '{asset}'",
                        component.reference
                    ));
                    if component.footprint.as_deref() == Some(asset.as_str()) {
                        component.footprint = None;
                    } else {
                        component.symbol = None;
                    }
                }
                Err(RecordError::InvalidLocalPath(ref path)) => {
                    self.warn(format!(
                        "{}: dropping non-portable datasheet path '{path}'",
                        component.reference
                    ));
                    component.datasheet_local = None;
                }
                Err(e) => {
                    self.skip(format!("skipping record: {e}"));
                    return;
                }
            }
        }
    }
}

/// Ingest an export file, choosing the parser from the file extension.
pub fn ingest_file(path: &Path) -> Result<IngestReport, IngestError> {
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let content = std::fs::read_to_string(path)?;

    match extension.as_str() {
        "csv" => Ok(parse_tabular(&content, &source_name)),
        "xml" => parse_netlist(&content, &source_name),
        other => Err(IngestError::UnsupportedFormat(other.to_string())),
    }
}

/// `~` is KiCad's explicit empty-value marker.
pub(crate) fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty() && t != "~").then(|| t.to_string())
}

/// Route a datasheet cell to the URL or local-path field.
pub(crate) fn split_datasheet(component: &mut Component, datasheet: Option<String>) {
    match datasheet {
        Some(ds) if ds.starts_with("http://") || ds.starts_with("https://") => {
            component.datasheet_url = Some(ds);
        }
        Some(ds) => component.datasheet_local = Some(ds),
        None => {}
    }
}

/// Normalize a header or field name: lowercased, trimmed, spaces to
/// underscores, `#` spelled out.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('#', "number")
}
