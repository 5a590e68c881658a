//! Deterministic, explainable health scoring.
//!
//! The scorer is a pure function over a component's verification status and
//! a fixed rule table. Each category (datasheet, footprint, symbol, MPN)
//! contributes exactly one trail entry — either the points awarded and why,
//! or the recorded fact that nothing was awarded. Within the footprint
//! category several states can hold at once, so a strict precedence picks
//! the single state that contributes.

use bomcheck_model::{Component, FootprintProvenance, HealthScore, Verification};
use serde::{Deserialize, Serialize};

/// Point values per scoring rule. All values default; a rule table loaded
/// from configuration only needs to name the ones it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorePoints {
    pub datasheet_local: f64,
    pub footprint_manual: f64,
    pub footprint_api_verified: f64,
    pub footprint_catalog: f64,
    pub footprint_library: f64,
    pub footprint_review_pending: f64,
    pub footprint_suggested: f64,
    pub footprint_found: f64,
    pub symbol_definition: f64,
    pub symbol_library_found: f64,
    pub mpn: f64,
}

impl Default for ScorePoints {
    fn default() -> Self {
        ScorePoints {
            datasheet_local: 1.0,
            footprint_manual: 2.0,
            footprint_api_verified: 1.8,
            footprint_catalog: 1.5,
            footprint_library: 1.0,
            footprint_review_pending: 0.2,
            footprint_suggested: 0.1,
            footprint_found: 0.5,
            symbol_definition: 1.0,
            symbol_library_found: 0.2,
            mpn: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreThresholds {
    /// Components scoring below this are flagged for review
    pub needs_review_below: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        ScoreThresholds {
            needs_review_below: 4.0,
        }
    }
}

/// The rule table: point values, thresholds, and a version tag carried into
/// every score for traceability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRules {
    pub points: ScorePoints,
    pub thresholds: ScoreThresholds,
    pub version: String,
}

impl Default for ScoreRules {
    fn default() -> Self {
        ScoreRules {
            points: ScorePoints::default(),
            thresholds: ScoreThresholds::default(),
            version: "1.0".to_string(),
        }
    }
}

/// Scorer over a fixed rule table. The maximum achievable score is computed
/// once here, not per component.
#[derive(Debug, Clone)]
pub struct Scorer {
    rules: ScoreRules,
    max_possible: f64,
}

impl Scorer {
    pub fn new(rules: ScoreRules) -> Self {
        let p = &rules.points;
        let best_footprint = p
            .footprint_manual
            .max(p.footprint_api_verified)
            .max(p.footprint_catalog)
            .max(p.footprint_library);
        let max_possible =
            (p.datasheet_local + best_footprint + p.symbol_definition + p.mpn).max(1.0);
        log::debug!(
            "scorer initialized, rules v{}, max possible {max_possible:.1}",
            rules.version
        );
        Scorer {
            rules,
            max_possible,
        }
    }

    pub fn rules(&self) -> &ScoreRules {
        &self.rules
    }

    pub fn max_possible(&self) -> f64 {
        self.max_possible
    }

    pub fn needs_review(&self, health: &HealthScore) -> bool {
        health.score < self.rules.thresholds.needs_review_below
    }

    /// Compute the health score for a component. Pure: reads status flags
    /// and the provenance tag, touches nothing.
    pub fn score(&self, component: &Component) -> HealthScore {
        let p = &self.rules.points;
        let status = &component.status;
        let mut score = 0.0;
        let mut details = Vec::with_capacity(4);
        let mut award = |points: f64, why: String, details: &mut Vec<String>| {
            score += points;
            details.push(format!("[+{points:.1}] {why}"));
        };

        // datasheet
        if status.datasheet_local_valid {
            award(p.datasheet_local, "datasheet present locally".into(), &mut details);
        } else if component.datasheet_url.is_some() {
            details.push("[0.0] datasheet URL only, no verified local copy".to_string());
        } else {
            details.push("[0.0] datasheet missing".to_string());
        }

        // footprint: several states can hold at once; only the single
        // highest-precedence state contributes
        let has_footprint = component.footprint.is_some();
        if has_footprint && status.footprint_verified == Verification::Verified {
            let (points, origin) = match component.footprint_provenance {
                FootprintProvenance::Manual => (p.footprint_manual, "manual project asset"),
                FootprintProvenance::ApiVerified => (p.footprint_api_verified, "api-verified"),
                FootprintProvenance::CatalogVerified => (p.footprint_catalog, "catalog part"),
                FootprintProvenance::Unknown => (p.footprint_library, "library"),
            };
            award(points, format!("footprint verified ({origin})"), &mut details);
        } else if status.footprint_verified == Verification::Pending {
            // a staged download awaits review; the asset is not in a
            // trusted library yet, so the footprint field may be empty
            award(p.footprint_review_pending, "footprint awaiting review".into(), &mut details);
        } else if has_footprint && status.footprint_from_search {
            award(
                p.footprint_suggested,
                "footprint externally suggested, unverified".into(),
                &mut details,
            );
        } else if has_footprint && status.footprint_found {
            award(
                p.footprint_found,
                "footprint found in libraries, unverified".into(),
                &mut details,
            );
        } else {
            details.push("[0.0] footprint missing or not found".to_string());
        }

        // symbol
        if status.symbol_definition_found {
            award(p.symbol_definition, "symbol definition found".into(), &mut details);
        } else if status.symbol_lib_found && status.symbol_lib_parsed {
            award(
                p.symbol_library_found,
                "symbol library found, definition missing".into(),
                &mut details,
            );
        } else {
            details.push("[0.0] symbol not found".to_string());
        }

        // mpn
        if component.mpn.as_deref().is_some_and(|m| !m.trim().is_empty()) {
            award(p.mpn, "MPN provided".into(), &mut details);
        } else {
            details.push("[0.0] MPN missing".to_string());
        }

        HealthScore {
            score: (score * 100.0).round() / 100.0,
            max_possible: self.max_possible,
            details,
            rules_version: Some(self.rules.version.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> Scorer {
        Scorer::new(ScoreRules::default())
    }

    fn zero_entries(health: &HealthScore) -> usize {
        health.details.iter().filter(|d| d.starts_with("[0.0]")).count()
    }

    #[test]
    fn test_no_data_scores_zero_with_four_entries() {
        let c = Component::new("R1", "10k");
        let health = scorer().score(&c);
        assert_eq!(health.score, 0.0);
        assert_eq!(health.details.len(), 4);
        assert_eq!(zero_entries(&health), 4);
    }

    #[test]
    fn test_partial_data_sums_exactly() {
        let mut c = Component::new("R1", "10k");
        c.status.datasheet_local_valid = true;
        c.mpn = Some("RC0805FR-0710KL".to_string());
        let health = scorer().score(&c);
        // datasheet_local (1.0) + mpn (0.5), nothing else
        assert_eq!(health.score, 1.5);
        assert_eq!(health.details.len(), 4);
        assert_eq!(zero_entries(&health), 2);
    }

    #[test]
    fn test_footprint_states_never_double_count() {
        let mut c = Component::new("R1", "10k");
        c.footprint = Some("Lib:FP".to_string());
        c.footprint_provenance = FootprintProvenance::Manual;
        c.status.footprint_found = true;
        c.status.footprint_from_search = true;
        c.status.footprint_verified = Verification::Verified;
        let health = scorer().score(&c);
        // only the verified state contributes, found/suggested are shadowed
        assert_eq!(health.score, 2.0);
        let footprint_entries: Vec<&String> = health
            .details
            .iter()
            .filter(|d| d.contains("footprint"))
            .collect();
        assert_eq!(footprint_entries.len(), 1);
    }

    #[test]
    fn test_footprint_precedence_order() {
        let mut c = Component::new("R1", "10k");
        c.footprint = Some("Lib:FP".to_string());
        c.status.footprint_found = true;
        assert_eq!(scorer().score(&c).score, 0.5);

        c.status.footprint_from_search = true;
        assert_eq!(scorer().score(&c).score, 0.1);

        c.status.footprint_verified = Verification::Pending;
        assert_eq!(scorer().score(&c).score, 0.2);

        c.status.footprint_verified = Verification::Verified;
        // provenance unknown -> library points
        assert_eq!(scorer().score(&c).score, 1.0);
    }

    #[test]
    fn test_verified_points_differ_by_provenance() {
        let mut c = Component::new("R1", "10k");
        c.footprint = Some("Lib:FP".to_string());
        c.status.footprint_verified = Verification::Verified;

        let expectations = [
            (FootprintProvenance::Manual, 2.0),
            (FootprintProvenance::ApiVerified, 1.8),
            (FootprintProvenance::CatalogVerified, 1.5),
            (FootprintProvenance::Unknown, 1.0),
        ];
        for (provenance, expected) in expectations {
            c.footprint_provenance = provenance;
            assert_eq!(scorer().score(&c).score, expected, "{provenance:?}");
        }
    }

    #[test]
    fn test_symbol_precedence() {
        let mut c = Component::new("R1", "10k");
        c.status.symbol_lib_found = true;
        c.status.symbol_lib_parsed = true;
        assert_eq!(scorer().score(&c).score, 0.2);

        c.status.symbol_definition_found = true;
        assert_eq!(scorer().score(&c).score, 1.0);
    }

    #[test]
    fn test_unparsed_symbol_library_earns_nothing() {
        let mut c = Component::new("R1", "10k");
        c.status.symbol_lib_found = true;
        let health = scorer().score(&c);
        assert_eq!(health.score, 0.0);
        assert!(health.details.iter().any(|d| d == "[0.0] symbol not found"));
    }

    #[test]
    fn test_datasheet_url_only_is_recorded_zero() {
        let mut c = Component::new("R1", "10k");
        c.datasheet_url = Some("https://example.com/ds.pdf".to_string());
        let health = scorer().score(&c);
        assert_eq!(health.score, 0.0);
        assert!(health.details[0].contains("URL only"));
    }

    #[test]
    fn test_max_possible_computed_once() {
        let s = scorer();
        // 1.0 + 2.0 + 1.0 + 0.5
        assert_eq!(s.max_possible(), 4.5);
        let c = Component::new("R1", "10k");
        assert_eq!(s.score(&c).max_possible, 4.5);
    }

    #[test]
    fn test_rules_version_carried() {
        let mut rules = ScoreRules::default();
        rules.version = "2.3".to_string();
        let health = Scorer::new(rules).score(&Component::new("R1", "x"));
        assert_eq!(health.rules_version.as_deref(), Some("2.3"));
    }

    #[test]
    fn test_rules_deserialize_with_defaults() {
        let rules: ScoreRules =
            serde_yaml::from_str("points:\n  mpn: 3.0\nversion: custom\n").unwrap();
        assert_eq!(rules.points.mpn, 3.0);
        assert_eq!(rules.points.datasheet_local, 1.0);
        assert_eq!(rules.version, "custom");
        // max picks up the override
        assert_eq!(Scorer::new(rules).max_possible(), 7.0);
    }

    #[test]
    fn test_needs_review_threshold() {
        let s = scorer();
        let mut c = Component::new("R1", "10k");
        assert!(s.needs_review(&s.score(&c)));
        c.status.datasheet_local_valid = true;
        c.status.footprint_verified = Verification::Verified;
        c.footprint = Some("Lib:FP".to_string());
        c.footprint_provenance = FootprintProvenance::Manual;
        c.status.symbol_definition_found = true;
        c.mpn = Some("X".to_string());
        assert!(!s.needs_review(&s.score(&c)));
    }
}
