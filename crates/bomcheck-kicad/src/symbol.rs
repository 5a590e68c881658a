//! Parsing of `.kicad_sym` symbol library files. A library file holds many
//! named symbol definitions; the verification pipeline only needs to know
//! which names are defined.

use crate::KicadError;
use bomcheck_sexpr::Sexpr;
use std::fs;
use std::path::Path;

/// A KiCad symbol library: the set of symbol definitions it contains.
#[derive(Debug, Clone)]
pub struct SymbolLibrary {
    names: Vec<String>,
}

impl SymbolLibrary {
    /// Parse a symbol library from source text.
    pub fn from_string(content: &str) -> Result<Self, KicadError> {
        let root = bomcheck_sexpr::parse(content)?;
        if root.tag() != Some("kicad_symbol_lib") {
            return Err(KicadError::InvalidFormat {
                kind: "symbol library",
                reason: format!("expected (kicad_symbol_lib ...), found {:?}", root.tag()),
            });
        }

        let mut names = Vec::new();
        for node in root.find_all_lists("symbol") {
            match node.get(1).and_then(Sexpr::as_atom) {
                Some(name) => names.push(name.to_string()),
                // tolerate a malformed entry, keep the rest of the library
                None => log::warn!("symbol definition without a name, skipping"),
            }
        }
        Ok(SymbolLibrary { names })
    }

    /// Parse a symbol library from a `.kicad_sym` file.
    pub fn from_file(path: &Path) -> Result<Self, KicadError> {
        let content = fs::read_to_string(path)?;
        Self::from_string(&content)
    }

    /// Names of all symbols defined in the library.
    pub fn symbol_names(&self) -> &[String] {
        &self.names
    }

    /// Whether the library defines a symbol with the given name.
    pub fn has_symbol(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}
