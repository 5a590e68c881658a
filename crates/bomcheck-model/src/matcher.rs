//! Exact-field matching of BoM components against the catalog.
//!
//! Matching is deliberately precision-over-recall: an MPN tier, then a
//! value+package tier, and nothing fuzzier. No match is a normal outcome.

use crate::catalog::{CatalogItem, CatalogStore};
use crate::component::Component;
use std::collections::BTreeMap;

/// Canonical match input. Every caller — whether it holds a full
/// [`Component`] or a loose key→value map — goes through this adapter
/// before any matching logic runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchQuery {
    pub mpn: Option<String>,
    pub value: Option<String>,
    pub package: Option<String>,
}

impl MatchQuery {
    /// Build a query from raw key→value fields (`mpn`, `value`, `package`).
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Self {
        let field = |k: &str| fields.get(k).map(|v| v.trim()).filter(|v| !v.is_empty());
        MatchQuery {
            mpn: field("mpn").map(str::to_string),
            value: field("value").map(str::to_string),
            package: field("package").map(str::to_string),
        }
    }
}

impl From<&Component> for MatchQuery {
    fn from(c: &Component) -> Self {
        let non_empty = |s: &str| {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        };
        MatchQuery {
            mpn: c.mpn.as_deref().and_then(non_empty),
            value: non_empty(&c.value),
            package: c.package.as_deref().and_then(non_empty),
        }
    }
}

impl CatalogStore {
    /// Find the catalog part matching a query. Strict priority order, first
    /// match wins:
    ///
    /// 1. case-insensitive MPN equality (both sides non-empty)
    /// 2. case-insensitive equality of both value and package
    ///
    /// Returns a snapshot of the matched part, never a reference into the
    /// catalog.
    pub fn find_match(&self, query: &MatchQuery) -> Option<CatalogItem> {
        if let Some(mpn) = &query.mpn {
            let hit = self.parts().iter().find(|p| {
                p.mpn
                    .as_deref()
                    .is_some_and(|m| !m.is_empty() && m.eq_ignore_ascii_case(mpn))
            });
            if let Some(part) = hit {
                log::debug!("MPN match '{}' -> {}", mpn, part.part_id);
                return Some(part.clone());
            }
        }

        if let (Some(value), Some(package)) = (&query.value, &query.package) {
            let hit = self.parts().iter().find(|p| {
                p.value
                    .as_deref()
                    .is_some_and(|v| v.eq_ignore_ascii_case(value))
                    && p.package
                        .as_deref()
                        .is_some_and(|k| k.eq_ignore_ascii_case(package))
            });
            if let Some(part) = hit {
                log::debug!(
                    "value+package match '{}/{}' -> {}",
                    value,
                    package,
                    part.part_id
                );
                return Some(part.clone());
            }
        }

        None
    }
}
