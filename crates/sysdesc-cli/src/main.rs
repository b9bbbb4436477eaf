//! sysdesc CLI
//!
//! Command-line interface for stored system descriptions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sysdesc_core::logging_facility::init;
use sysdesc_core::Config;
use sysdesc_store::DescriptionStore;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sysdesc")]
#[command(about = "sysdesc - Compare, validate and upgrade system descriptions", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Configuration file (TOML); defaults apply when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Description store directory, overriding the configuration
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare two stored descriptions scope by scope
    Compare(commands::compare::CompareArgs),
    /// Upgrade stored descriptions to the current format
    UpgradeFormat(commands::upgrade::UpgradeArgs),
    /// Validate a stored description
    Validate(commands::validate::ValidateArgs),
    /// List stored descriptions and their format status
    List,
}

fn load_config(global: &GlobalArgs) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match &global.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Ok(match &global.store {
        Some(store) => config.with_store_dir(store.clone()),
        None => config,
    })
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli.global)?;
    init(config.log_profile);
    let store = DescriptionStore::from_config(&config);

    match cli.command {
        Commands::Compare(args) => commands::compare::execute(&store, args),
        Commands::UpgradeFormat(args) => commands::upgrade::execute(&store, args),
        Commands::Validate(args) => commands::validate::execute(&store, args),
        Commands::List => commands::list::execute(&store),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
