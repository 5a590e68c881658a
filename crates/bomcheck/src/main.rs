use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod catalog;
mod health;
mod import;
mod verify;

#[derive(Parser)]
#[command(name = "bomcheck")]
#[command(about = "BoM verification and health scoring for PCB projects", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a KiCad BoM export (CSV or XML) into the canonical BoM
    #[command(alias = "i")]
    Import(import::ImportArgs),

    /// Verify components against catalog and libraries, recompute health
    #[command(alias = "v")]
    Verify(verify::VerifyArgs),

    /// Show component health scores
    #[command(alias = "h")]
    Health(health::HealthArgs),

    /// Manage the parts catalog
    Catalog(catalog::CatalogArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug; RUST_LOG still wins
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Import(args) => import::execute(args),
        Commands::Verify(args) => verify::execute(args),
        Commands::Health(args) => health::execute(args),
        Commands::Catalog(args) => catalog::execute(args),
    }
}
