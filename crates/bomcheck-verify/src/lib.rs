//! The per-component verification engine: catalog matching, library asset
//! resolution, geometry extraction, and health scoring, driven over a batch
//! of components.
//!
//! Every shared input (rule table, search roots, catalog) is passed in as
//! an explicit, immutable value. Verification of one component never
//! depends on another's result, so the batch runs in parallel; N inputs
//! always produce N results, with per-component problems recorded as notes.

pub mod ports;

pub use ports::{PortError, RemoteAsset, RemotePartsProvider, SuggestionOutcome, SuggestionProvider};

use bomcheck_kicad::{SearchPaths, extract_geometry, resolve_footprint, resolve_symbol};
use bomcheck_model::{
    CatalogStore, Component, FootprintProvenance, FootprintSource, MatchQuery, Verification,
};
use bomcheck_score::{ScoreRules, Scorer};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::PathBuf;

/// Immutable configuration for one verification pass.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub project_root: PathBuf,
    pub footprint_paths: SearchPaths,
    pub symbol_paths: SearchPaths,
    /// Review area for remote downloads; deliberately outside the library
    /// search roots
    pub staging_dir: PathBuf,
    pub rules: ScoreRules,
}

impl VerifyConfig {
    /// Configuration for a project rooted at `project_root`, searching the
    /// project's `libs/` directory before the given standard roots.
    pub fn new(
        project_root: impl Into<PathBuf>,
        standard_footprint_roots: Vec<PathBuf>,
        standard_symbol_roots: Vec<PathBuf>,
        rules: ScoreRules,
    ) -> Self {
        let project_root = project_root.into();
        let project_libs = project_root.join("libs");
        VerifyConfig {
            footprint_paths: SearchPaths::new(project_libs.clone(), standard_footprint_roots),
            symbol_paths: SearchPaths::new(project_libs, standard_symbol_roots),
            staging_dir: project_root.join("review"),
            project_root,
            rules,
        }
    }
}

/// Optional overrides loaded from a `bomcheck.yaml` next to the project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub standard_footprint_libs: Vec<PathBuf>,
    pub standard_symbol_libs: Vec<PathBuf>,
    pub rules: ScoreRules,
}

/// Verification engine over one store generation. Holds read-only borrows;
/// mutation of the stores happens outside, after the pass.
pub struct Verifier<'a> {
    config: &'a VerifyConfig,
    catalog: &'a CatalogStore,
    scorer: Scorer,
    suggestions: Option<&'a dyn SuggestionProvider>,
    remote_parts: Option<&'a dyn RemotePartsProvider>,
}

impl<'a> Verifier<'a> {
    pub fn new(config: &'a VerifyConfig, catalog: &'a CatalogStore) -> Self {
        Verifier {
            config,
            catalog,
            scorer: Scorer::new(config.rules.clone()),
            suggestions: None,
            remote_parts: None,
        }
    }

    pub fn with_suggestions(mut self, provider: &'a dyn SuggestionProvider) -> Self {
        self.suggestions = Some(provider);
        self
    }

    pub fn with_remote_parts(mut self, provider: &'a dyn RemotePartsProvider) -> Self {
        self.remote_parts = Some(provider);
        self
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Verify one component, returning the updated copy. Observed status
    /// flags are recomputed from scratch; acceptance state
    /// (`footprint_verified`, `footprint_from_search`) carries over.
    pub fn verify(&self, component: &Component) -> Component {
        let mut c = component.clone();
        c.status.datasheet_local_valid = false;
        c.status.footprint_found = false;
        c.status.footprint_parsed = false;
        c.status.symbol_lib_found = false;
        c.status.symbol_lib_parsed = false;
        c.status.symbol_definition_found = false;

        self.check_datasheet(&mut c);
        self.match_catalog(&mut c);
        self.apply_suggestion(&mut c);
        self.fetch_remote(&mut c);
        self.check_footprint(&mut c);
        self.check_symbol(&mut c);

        c.health = self.scorer.score(&c);
        c
    }

    /// Verify a batch. Components are independent, so the pass is
    /// parallel; the output has one result per input, in input order.
    pub fn verify_all(&self, components: &[Component]) -> Vec<Component> {
        components.par_iter().map(|c| self.verify(c)).collect()
    }

    fn check_datasheet(&self, c: &mut Component) {
        let Some(path) = c.datasheet_local.clone() else {
            return;
        };
        c.status.datasheet_local_valid = self.config.project_root.join(&path).is_file();
        if !c.status.datasheet_local_valid {
            c.add_note(format!("datasheet path '{path}' does not exist"));
        }
    }

    fn match_catalog(&self, c: &mut Component) {
        let Some(part) = self.catalog.find_match(&MatchQuery::from(&*c)) else {
            return;
        };
        if c.footprint.is_none() {
            c.footprint = Some(part.footprint.clone());
            c.footprint_provenance = match part.footprint_source {
                FootprintSource::ApiVerified => FootprintProvenance::ApiVerified,
                FootprintSource::Manual | FootprintSource::CatalogIngestVerified => {
                    FootprintProvenance::CatalogVerified
                }
                FootprintSource::Unknown => FootprintProvenance::Unknown,
            };
            c.status.footprint_verified = Verification::Verified;
            c.add_note(format!(
                "footprint adopted from catalog part {}",
                part.part_id
            ));
        } else {
            c.add_note(format!("matches catalog part {}", part.part_id));
        }
    }

    fn apply_suggestion(&self, c: &mut Component) {
        if c.footprint.is_some() {
            return;
        }
        let Some(provider) = self.suggestions else {
            c.add_note("footprint suggestion skipped (no provider)");
            return;
        };
        match provider.suggest_footprint(c) {
            Ok(SuggestionOutcome::Suggestion {
                footprint,
                rationale,
            }) => {
                c.footprint = Some(footprint);
                c.footprint_provenance = FootprintProvenance::Unknown;
                c.status.footprint_from_search = true;
                c.add_note(format!("footprint suggested, needs verification ({rationale})"));
            }
            Ok(SuggestionOutcome::Uncertain) => {
                c.add_note("footprint suggestion uncertain, nothing assigned");
            }
            Err(e) => c.add_note(format!("footprint suggestion failed: {e}")),
        }
    }

    fn fetch_remote(&self, c: &mut Component) {
        if c.footprint.is_some() || c.status.footprint_verified == Verification::Pending {
            return;
        }
        let Some(mpn) = c.mpn.clone().filter(|m| !m.trim().is_empty()) else {
            return;
        };
        let Some(provider) = self.remote_parts else {
            c.add_note("remote footprint search skipped (no provider)");
            return;
        };
        let candidates = match provider.search(&mpn) {
            Ok(candidates) => candidates,
            Err(e) => {
                c.add_note(format!("remote footprint search failed: {e}"));
                return;
            }
        };
        let Some(asset) = candidates.first() else {
            c.add_note(format!("no remote footprint candidates for '{mpn}'"));
            return;
        };
        match provider.download(asset, &self.config.staging_dir) {
            Ok(staged) => {
                // staged assets stay unverified until explicitly promoted
                c.footprint = asset.footprint_ref.clone();
                c.status.footprint_verified = Verification::Pending;
                c.status.footprint_from_search = true;
                c.add_note(format!(
                    "footprint candidate from {} staged for review at {}",
                    asset.source,
                    staged.display()
                ));
            }
            Err(e) => c.add_note(format!("remote footprint download failed: {e}")),
        }
    }

    fn check_footprint(&self, c: &mut Component) {
        let Some(reference) = c.footprint.clone() else {
            return;
        };
        let resolution = resolve_footprint(&self.config.footprint_paths, &reference);
        c.status.footprint_found = resolution.found;
        c.status.footprint_parsed = resolution.usable;
        for error in &resolution.errors {
            c.add_note(format!("footprint: {error}"));
        }

        let Some(footprint) = &resolution.footprint else {
            return;
        };
        let geometry = extract_geometry(footprint);
        c.extracted_params
            .insert("pin_count".to_string(), geometry.pad_count.to_string());
        c.estimated_area = geometry.area_mm2;
        for note in &geometry.notes {
            c.add_note(format!("footprint geometry: {note}"));
        }
        for error in &geometry.errors {
            c.add_note(format!("footprint geometry: {error}"));
        }
    }

    fn check_symbol(&self, c: &mut Component) {
        let Some(reference) = c.symbol.clone() else {
            c.add_note("symbol check skipped (no symbol reference)");
            return;
        };
        let resolution = resolve_symbol(&self.config.symbol_paths, &reference);
        c.status.symbol_lib_found = resolution.library_found;
        c.status.symbol_lib_parsed = resolution.parsed;
        c.status.symbol_definition_found = resolution.definition_found;
        for error in &resolution.errors {
            c.add_note(format!("symbol: {error}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const FOOTPRINT: &str = r#"(footprint "R_0805"
        (fp_line (start -1.68 -0.95) (end 1.68 -0.95) (layer "F.CrtYd"))
        (fp_line (start 1.68 0.95) (end -1.68 0.95) (layer "F.CrtYd"))
        (pad "1" smd rect (at -0.9 0) (size 1 1))
        (pad "2" smd rect (at 0.9 0) (size 1 1))
    )"#;

    const SYMBOL_LIB: &str = r#"(kicad_symbol_lib
        (symbol "R" (property "Reference" "R" (at 0 0 0)))
    )"#;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let libs = dir.path().join("libs");
        let pretty = libs.join("Resistor_SMD.pretty");
        fs::create_dir_all(&pretty).unwrap();
        fs::write(pretty.join("R_0805.kicad_mod"), FOOTPRINT).unwrap();
        fs::write(pretty.join("R_bad.kicad_mod"), "(footprint").unwrap();
        fs::write(libs.join("Device.kicad_sym"), SYMBOL_LIB).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/r.pdf"), "pdf").unwrap();
        dir
    }

    fn config(dir: &TempDir) -> VerifyConfig {
        VerifyConfig::new(dir.path(), vec![], vec![], ScoreRules::default())
    }

    fn catalog(dir: &TempDir) -> CatalogStore {
        CatalogStore::open(dir.path().join("catalog.yaml")).unwrap()
    }

    fn full_component() -> Component {
        let mut c = Component::new("R1", "10k");
        c.footprint = Some("Resistor_SMD:R_0805".to_string());
        c.symbol = Some("Device:R".to_string());
        c.datasheet_local = Some("docs/r.pdf".to_string());
        c.mpn = Some("RC0805FR-0710KL".to_string());
        c
    }

    #[test]
    fn test_full_verification() {
        let dir = project();
        let cfg = config(&dir);
        let cat = catalog(&dir);
        let verifier = Verifier::new(&cfg, &cat);

        let result = verifier.verify(&full_component());
        assert!(result.status.datasheet_local_valid);
        assert!(result.status.footprint_found);
        assert!(result.status.footprint_parsed);
        assert!(result.status.symbol_lib_found);
        assert!(result.status.symbol_lib_parsed);
        assert!(result.status.symbol_definition_found);
        assert_eq!(result.extracted_params.get("pin_count").unwrap(), "2");
        assert_eq!(result.estimated_area, Some(6.38));
        // datasheet 1.0 + found-unverified 0.5 + symbol 1.0 + mpn 0.5
        assert_eq!(result.health.score, 3.0);
    }

    #[test]
    fn test_batch_always_yields_n_results() {
        let dir = project();
        let cfg = config(&dir);
        let cat = catalog(&dir);
        let verifier = Verifier::new(&cfg, &cat);

        let mut broken = Component::new("R2", "1k");
        broken.footprint = Some("Resistor_SMD:R_bad".to_string());
        let mut missing = Component::new("R3", "2k");
        missing.footprint = Some("Nowhere:Nothing".to_string());

        let input = vec![full_component(), broken, missing];
        let output = verifier.verify_all(&input);
        assert_eq!(output.len(), 3);
        // order preserved
        assert_eq!(output[0].reference, "R1");

        // found-but-unusable is distinct from not-found
        assert!(output[1].status.footprint_found);
        assert!(!output[1].status.footprint_parsed);
        assert!(output[1].notes.iter().any(|n| n.contains("unusable")));
        assert!(!output[2].status.footprint_found);
    }

    #[test]
    fn test_catalog_match_adopts_footprint() {
        let dir = project();
        let cfg = config(&dir);
        let mut cat = catalog(&dir);
        cat.add(bomcheck_model::CatalogItem {
            part_id: "CAT001".to_string(),
            description: "Chip resistor".to_string(),
            value: Some("10k".to_string()),
            package: Some("0805".to_string()),
            footprint: "Resistor_SMD:R_0805".to_string(),
            footprint_source: FootprintSource::Manual,
            mpn: Some("RC0805FR-0710KL".to_string()),
            quantity_on_hand: 10,
            storage_location: None,
            datasheet_local: None,
        });
        let verifier = Verifier::new(&cfg, &cat);

        let mut c = Component::new("R1", "10k");
        c.mpn = Some("RC0805FR-0710KL".to_string());
        let result = verifier.verify(&c);

        assert_eq!(result.footprint.as_deref(), Some("Resistor_SMD:R_0805"));
        assert_eq!(result.status.footprint_verified, Verification::Verified);
        assert_eq!(
            result.footprint_provenance,
            FootprintProvenance::CatalogVerified
        );
        assert!(result.notes.iter().any(|n| n.contains("CAT001")));
        // verified catalog footprint: 1.5 + mpn 0.5
        assert_eq!(result.health.score, 2.0);
    }

    #[test]
    fn test_missing_ports_degrade_to_notes() {
        let dir = project();
        let cfg = config(&dir);
        let cat = catalog(&dir);
        let verifier = Verifier::new(&cfg, &cat);

        let mut c = Component::new("U1", "LM358");
        c.mpn = Some("LM358DR".to_string());
        let result = verifier.verify(&c);
        assert!(result
            .notes
            .iter()
            .any(|n| n.contains("suggestion skipped")));
        assert!(result
            .notes
            .iter()
            .any(|n| n.contains("remote footprint search skipped")));
        // the cheap local checks still completed
        assert_eq!(result.health.details.len(), 4);
    }

    struct FixedSuggestion;
    impl SuggestionProvider for FixedSuggestion {
        fn suggest_footprint(&self, _: &Component) -> Result<SuggestionOutcome, PortError> {
            Ok(SuggestionOutcome::Suggestion {
                footprint: "Resistor_SMD:R_0805".to_string(),
                rationale: "package text".to_string(),
            })
        }
    }

    #[test]
    fn test_suggestion_populates_unverified_status() {
        let dir = project();
        let cfg = config(&dir);
        let cat = catalog(&dir);
        let provider = FixedSuggestion;
        let verifier = Verifier::new(&cfg, &cat).with_suggestions(&provider);

        let result = verifier.verify(&Component::new("R9", "10k"));
        assert_eq!(result.footprint.as_deref(), Some("Resistor_SMD:R_0805"));
        assert!(result.status.footprint_from_search);
        assert_eq!(result.status.footprint_verified, Verification::Unverified);
        // suggested footprints resolve like any other reference
        assert!(result.status.footprint_found);
    }

    struct StagingDownload {
        downloads: AtomicUsize,
    }
    impl RemotePartsProvider for StagingDownload {
        fn search(&self, mpn: &str) -> Result<Vec<RemoteAsset>, PortError> {
            Ok(vec![RemoteAsset {
                identifier: format!("remote-{mpn}"),
                mpn: mpn.to_string(),
                footprint_ref: None,
                source: "partserver".to_string(),
            }])
        }

        fn download(
            &self,
            asset: &RemoteAsset,
            staging_dir: &Path,
        ) -> Result<std::path::PathBuf, PortError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            fs::create_dir_all(staging_dir).map_err(|e| PortError::Failed(e.to_string()))?;
            let path = staging_dir.join(format!("{}.kicad_mod", asset.identifier));
            fs::write(&path, "(footprint \"staged\")").map_err(|e| PortError::Failed(e.to_string()))?;
            Ok(path)
        }
    }

    #[test]
    fn test_remote_download_stays_in_staging() {
        let dir = project();
        let cfg = config(&dir);
        let cat = catalog(&dir);
        let provider = StagingDownload {
            downloads: AtomicUsize::new(0),
        };
        let verifier = Verifier::new(&cfg, &cat).with_remote_parts(&provider);

        let mut c = Component::new("U1", "LM358");
        c.mpn = Some("LM358DR".to_string());
        let result = verifier.verify(&c);

        assert_eq!(provider.downloads.load(Ordering::SeqCst), 1);
        assert_eq!(result.status.footprint_verified, Verification::Pending);
        assert!(result.status.footprint_from_search);
        // the asset landed in review/, not in a trusted library root
        let staged = dir.path().join("review").join("remote-LM358DR.kicad_mod");
        assert!(staged.is_file());
        assert!(!dir.path().join("libs/remote-LM358DR.kicad_mod").exists());
        // pending review scores its own (low) state
        assert_eq!(result.health.score, 0.7);
    }

    #[test]
    fn test_verification_is_repeatable() {
        let dir = project();
        let cfg = config(&dir);
        let cat = catalog(&dir);
        let verifier = Verifier::new(&cfg, &cat);

        let once = verifier.verify(&full_component());
        let twice = verifier.verify(&once);
        assert_eq!(once.status, twice.status);
        assert_eq!(once.health.score, twice.health.score);
        assert_eq!(once.notes, twice.notes);
    }
}
