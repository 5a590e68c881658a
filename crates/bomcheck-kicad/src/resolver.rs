//! Locating footprint and symbol assets on an ordered library search path.
//!
//! Footprint libraries are `<name>.pretty` directories holding one
//! `.kicad_mod` file per asset; symbol libraries are single `<name>.kicad_sym`
//! files holding many definitions. Resolution reports independent facts
//! (found / parsed / definition present) rather than one collapsed boolean,
//! and parse failures are captured on the result instead of propagating.

use crate::footprint::Footprint;
use crate::symbol::SymbolLibrary;
use std::path::{Path, PathBuf};

/// Ordered library search roots. Project-local roots come before standard
/// system roots.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    roots: Vec<PathBuf>,
}

impl SearchPaths {
    pub fn new(project_root: impl Into<PathBuf>, standard: Vec<PathBuf>) -> Self {
        let mut roots = vec![project_root.into()];
        roots.extend(standard);
        SearchPaths { roots }
    }

    pub fn from_roots(roots: Vec<PathBuf>) -> Self {
        SearchPaths { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// A `Library:Name` asset reference, split at its single separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub library: String,
    pub name: String,
}

impl AssetRef {
    /// Split a reference string. References must contain exactly one `:`
    /// with non-empty parts on both sides; anything else is rejected.
    pub fn parse(reference: &str) -> Option<AssetRef> {
        if reference.chars().filter(|&c| c == ':').count() != 1 {
            return None;
        }
        let (library, name) = reference.split_once(':')?;
        if library.is_empty() || name.is_empty() {
            return None;
        }
        Some(AssetRef {
            library: library.to_string(),
            name: name.to_string(),
        })
    }
}

/// Outcome of footprint resolution. `found` and `usable` are independent:
/// a file can exist yet fail structural parsing.
#[derive(Debug, Clone, Default)]
pub struct FootprintResolution {
    pub found: bool,
    pub usable: bool,
    pub path: Option<PathBuf>,
    pub footprint: Option<Footprint>,
    pub errors: Vec<String>,
}

/// Outcome of symbol resolution: three independent facts, because a library
/// can exist and parse yet not contain the requested definition.
#[derive(Debug, Clone, Default)]
pub struct SymbolResolution {
    pub library_found: bool,
    pub parsed: bool,
    pub definition_found: bool,
    pub path: Option<PathBuf>,
    pub errors: Vec<String>,
}

/// Resolve a footprint reference against the search path.
///
/// The first root containing the `<library>.pretty` directory wins; the
/// asset file must exist and parse inside it.
pub fn resolve_footprint(paths: &SearchPaths, reference: &str) -> FootprintResolution {
    let mut result = FootprintResolution::default();
    let Some(asset) = AssetRef::parse(reference) else {
        result
            .errors
            .push(format!("'{reference}' is not a Library:Name reference"));
        return result;
    };

    let Some(lib_dir) = first_existing(paths, &format!("{}.pretty", asset.library), Path::is_dir)
    else {
        return result;
    };

    let file = lib_dir.join(format!("{}.kicad_mod", asset.name));
    if !file.is_file() {
        log::debug!("footprint '{reference}': library present, file missing");
        return result;
    }

    result.found = true;
    match Footprint::from_file(&file) {
        Ok(fp) => {
            result.usable = true;
            result.footprint = Some(fp);
        }
        Err(e) => {
            log::warn!("footprint '{reference}' exists but failed to parse: {e}");
            result.errors.push(format!("footprint file unusable: {e}"));
        }
    }
    result.path = Some(file);
    result
}

/// Resolve a symbol reference against the search path.
///
/// The first root containing the `<library>.kicad_sym` file wins.
pub fn resolve_symbol(paths: &SearchPaths, reference: &str) -> SymbolResolution {
    let mut result = SymbolResolution::default();
    let Some(asset) = AssetRef::parse(reference) else {
        result
            .errors
            .push(format!("'{reference}' is not a Library:Name reference"));
        return result;
    };

    let Some(file) = first_existing(paths, &format!("{}.kicad_sym", asset.library), Path::is_file)
    else {
        return result;
    };

    result.library_found = true;
    match SymbolLibrary::from_file(&file) {
        Ok(lib) => {
            result.parsed = true;
            result.definition_found = lib.has_symbol(&asset.name);
        }
        Err(e) => {
            log::warn!("symbol library '{}' failed to parse: {e}", asset.library);
            result.errors.push(format!("symbol library unusable: {e}"));
        }
    }
    result.path = Some(file);
    result
}

fn first_existing(
    paths: &SearchPaths,
    entry_name: &str,
    predicate: fn(&Path) -> bool,
) -> Option<PathBuf> {
    paths
        .roots()
        .iter()
        .map(|root| root.join(entry_name))
        .find(|candidate| predicate(candidate))
}
