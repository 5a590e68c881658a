use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bomcheck_model::{BomStore, CatalogStore};
use bomcheck_verify::{ConfigFile, Verifier, VerifyConfig};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug, Clone)]
#[command(about = "Verify components against catalog and libraries")]
pub struct VerifyArgs {
    /// Canonical BoM file
    #[arg(long, default_value = "bom.yaml")]
    pub bom: PathBuf,

    /// Parts catalog file
    #[arg(long, default_value = "catalog.yaml")]
    pub catalog: PathBuf,

    /// Project root (contains libs/ and datasheet paths)
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,

    /// Additional standard footprint library roots
    #[arg(long = "fp-lib", value_name = "DIR")]
    pub fp_libs: Vec<PathBuf>,

    /// Additional standard symbol library roots
    #[arg(long = "sym-lib", value_name = "DIR")]
    pub sym_libs: Vec<PathBuf>,

    /// Config file with library roots and rule overrides
    /// (default: <project-root>/bomcheck.yaml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn execute(args: VerifyArgs) -> Result<()> {
    let file_config = load_config_file(&args)?;

    let mut footprint_roots = args.fp_libs.clone();
    footprint_roots.extend(file_config.standard_footprint_libs);
    let mut symbol_roots = args.sym_libs.clone();
    symbol_roots.extend(file_config.standard_symbol_libs);

    let config = VerifyConfig::new(
        &args.project_root,
        footprint_roots,
        symbol_roots,
        file_config.rules,
    );

    let mut bom = BomStore::open(&args.bom)
        .with_context(|| format!("failed to open {}", args.bom.display()))?;
    let catalog = CatalogStore::open(&args.catalog)
        .with_context(|| format!("failed to open {}", args.catalog.display()))?;

    if bom.is_empty() {
        println!("BoM {} is empty, nothing to verify", args.bom.display());
        return Ok(());
    }

    let verifier = Verifier::new(&config, &catalog);
    let results = verifier.verify_all(bom.components());

    let total = results.len();
    let needs_review = results
        .iter()
        .filter(|c| verifier.scorer().needs_review(&c.health))
        .count();
    let max_possible = verifier.scorer().max_possible();

    // bulk write-back after the parallel pass
    let export_source = bom.document().export_source.clone();
    bom.replace_all(results, export_source);
    bom.save()
        .with_context(|| format!("failed to save {}", args.bom.display()))?;

    println!("Verified {total} components (scores out of {max_possible:.1})");
    if needs_review > 0 {
        println!(
            "{}",
            format!("{needs_review} components need review, run `bomcheck health --details`")
                .yellow()
        );
    }
    Ok(())
}

fn load_config_file(args: &VerifyArgs) -> Result<ConfigFile> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => {
            let default = args.project_root.join("bomcheck.yaml");
            if !default.is_file() {
                return Ok(ConfigFile::default());
            }
            default
        }
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
}
