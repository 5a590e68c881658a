use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use bomcheck_model::{BomStore, Component};
use bomcheck_score::{ScoreRules, Scorer};
use clap::{Args, ValueEnum};
use colored::Colorize;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL_CONDENSED;

#[derive(ValueEnum, Debug, Clone, Default)]
pub enum HealthFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for HealthFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthFormat::Table => write!(f, "table"),
            HealthFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Args, Debug, Clone)]
#[command(about = "Show component health scores")]
pub struct HealthArgs {
    /// Canonical BoM file
    #[arg(long, default_value = "bom.yaml")]
    pub bom: PathBuf,

    /// Output format
    #[arg(short, long, default_value_t = HealthFormat::Table)]
    pub format: HealthFormat,

    /// Print the per-category scoring trail for each component
    #[arg(long)]
    pub details: bool,
}

pub fn execute(args: HealthArgs) -> Result<()> {
    let store = BomStore::open(&args.bom)
        .with_context(|| format!("failed to open {}", args.bom.display()))?;

    let mut components: Vec<&Component> = store.components().iter().collect();
    components.sort_by(|a, b| natord::compare(&a.reference, &b.reference));

    let mut writer = io::stdout().lock();
    match args.format {
        HealthFormat::Json => {
            let json = serde_json::to_string_pretty(&components)?;
            writeln!(writer, "{json}")?;
        }
        HealthFormat::Table => write_health_table(&components, args.details, writer)?,
    }
    Ok(())
}

fn write_health_table<W: Write>(
    components: &[&Component],
    details: bool,
    mut writer: W,
) -> io::Result<()> {
    let scorer = Scorer::new(ScoreRules::default());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        "Reference",
        "Value",
        "Qty",
        "Footprint",
        "MPN",
        "Score",
    ]);
    for c in components {
        table.add_row(vec![
            c.reference.clone(),
            c.value.clone(),
            c.quantity.to_string(),
            c.footprint.clone().unwrap_or_else(|| "-".to_string()),
            c.mpn.clone().unwrap_or_else(|| "-".to_string()),
            format!("{:.1}/{:.1}", c.health.score, c.health.max_possible),
        ]);
    }
    writeln!(writer, "{table}")?;

    let needs_review: Vec<&&Component> = components
        .iter()
        .filter(|c| scorer.needs_review(&c.health))
        .collect();
    if !needs_review.is_empty() {
        writeln!(
            writer,
            "{}",
            format!("{} components need review", needs_review.len()).yellow()
        )?;
    }

    if details {
        for c in components {
            writeln!(writer, "\n{} ({})", c.reference.bold(), c.value)?;
            for line in &c.health.details {
                writeln!(writer, "  {line}")?;
            }
            for note in &c.notes {
                writeln!(writer, "  {} {note}", "note:".dimmed())?;
            }
        }
    }
    Ok(())
}
