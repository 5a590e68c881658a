use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use bomcheck_model::{CatalogItem, CatalogStore, FootprintSource};
use clap::{Args, Subcommand, ValueEnum};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL_CONDENSED;

#[derive(Args, Debug, Clone)]
#[command(about = "Manage the parts catalog")]
pub struct CatalogArgs {
    /// Parts catalog file
    #[arg(long, default_value = "catalog.yaml", global = true)]
    pub catalog: PathBuf,

    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CatalogCommand {
    /// List catalog parts
    List,

    /// Show the next free part id
    NextId,

    /// Add a part with a freshly allocated id
    Add(AddArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum SourceArg {
    Manual,
    ApiVerified,
    CatalogIngestVerified,
    #[default]
    Unknown,
}

impl From<SourceArg> for FootprintSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Manual => FootprintSource::Manual,
            SourceArg::ApiVerified => FootprintSource::ApiVerified,
            SourceArg::CatalogIngestVerified => FootprintSource::CatalogIngestVerified,
            SourceArg::Unknown => FootprintSource::Unknown,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Part description
    #[arg(long)]
    pub description: String,

    /// Verified footprint (Library:Name)
    #[arg(long)]
    pub footprint: String,

    /// How the footprint was verified
    #[arg(long, value_enum, default_value_t = SourceArg::Unknown)]
    pub source: SourceArg,

    #[arg(long)]
    pub value: Option<String>,

    #[arg(long)]
    pub package: Option<String>,

    #[arg(long)]
    pub mpn: Option<String>,

    /// Physical quantity on hand
    #[arg(long, default_value_t = 0)]
    pub quantity: u32,

    /// Storage location, e.g. "Bin A3"
    #[arg(long)]
    pub location: Option<String>,
}

pub fn execute(args: CatalogArgs) -> Result<()> {
    let mut store = CatalogStore::open(&args.catalog)
        .with_context(|| format!("failed to open {}", args.catalog.display()))?;

    match args.command {
        CatalogCommand::List => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_header(vec![
                "Part ID",
                "Description",
                "Value",
                "Package",
                "Footprint",
                "MPN",
                "Qty",
                "Location",
            ]);
            for part in store.parts() {
                table.add_row(vec![
                    part.part_id.clone(),
                    part.description.clone(),
                    part.value.clone().unwrap_or_else(|| "-".to_string()),
                    part.package.clone().unwrap_or_else(|| "-".to_string()),
                    part.footprint.clone(),
                    part.mpn.clone().unwrap_or_else(|| "-".to_string()),
                    part.quantity_on_hand.to_string(),
                    part.storage_location.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{table}");
        }
        CatalogCommand::NextId => println!("{}", store.next_part_id()),
        CatalogCommand::Add(add) => {
            let part = CatalogItem {
                part_id: store.next_part_id(),
                description: add.description,
                value: add.value,
                package: add.package,
                footprint: add.footprint,
                footprint_source: add.source.into(),
                mpn: add.mpn,
                quantity_on_hand: add.quantity,
                storage_location: add.location,
                datasheet_local: None,
            };
            part.validate().context("invalid catalog part")?;
            let part_id = part.part_id.clone();
            if !store.add(part) {
                bail!("part id '{part_id}' already exists");
            }
            store
                .save()
                .with_context(|| format!("failed to save {}", args.catalog.display()))?;
            println!("Added {part_id}");
        }
    }
    Ok(())
}
