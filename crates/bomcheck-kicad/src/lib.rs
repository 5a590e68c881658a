//! KiCad library asset handling: locating footprint/symbol libraries on a
//! search path, structural parsing, and footprint geometry extraction.

pub mod footprint;
pub mod resolver;
pub mod symbol;

pub use footprint::{AreaSource, Footprint, FootprintGeometry, extract_geometry};
pub use resolver::{
    AssetRef, FootprintResolution, SearchPaths, SymbolResolution, resolve_footprint,
    resolve_symbol,
};
pub use symbol::SymbolLibrary;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KicadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S-expression parse error: {0}")]
    Sexpr(#[from] bomcheck_sexpr::ParseError),

    #[error("invalid {kind} file: {reason}")]
    InvalidFormat { kind: &'static str, reason: String },
}
