use std::path::PathBuf;

use anyhow::{Context, Result};
use bomcheck_ingest::IngestReport;
use bomcheck_model::BomStore;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug, Clone)]
#[command(about = "Import a KiCad BoM export into the canonical BoM")]
pub struct ImportArgs {
    /// Export file to ingest (.csv or .xml)
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Canonical BoM file
    #[arg(long, default_value = "bom.yaml")]
    pub bom: PathBuf,
}

pub fn execute(args: ImportArgs) -> Result<()> {
    let IngestReport {
        components,
        skipped,
        warnings,
    } = bomcheck_ingest::ingest_file(&args.file)
        .with_context(|| format!("failed to ingest {}", args.file.display()))?;

    // import replaces the previous ingestion result wholesale
    let mut store = BomStore::open(&args.bom)
        .with_context(|| format!("failed to open {}", args.bom.display()))?;
    let count = components.len();
    store.replace_all(components, Some(args.file.display().to_string()));
    store
        .save()
        .with_context(|| format!("failed to save {}", args.bom.display()))?;

    println!(
        "Imported {count} components into {} ({skipped} rows skipped)",
        args.bom.display()
    );
    for warning in &warnings {
        eprintln!("  {} {warning}", "warning:".yellow());
    }
    Ok(())
}
