//! addonrepo CLI - Command-line interface
//!
//! Builds a Kodi addon repository from a directory of addon sources: the
//! `addons.xml` catalog and checksum, versioned zips, and addon artwork.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use console::style;

use addonrepo::logging::init_logging;

use commands::build::BuildArgs;
use commands::common::{load_config, resolve_log_config, resolve_repo_config, GlobalArgs};
use commands::init::InitArgs;
use commands::package::PackageArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "addonrepo")]
#[command(version, about = "Build and publish Kodi addon repositories", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the catalog, package every addon and copy artwork
    Build(BuildArgs),

    /// Regenerate addons.xml and addons.xml.md5 only
    Catalog,

    /// Package addons without touching the catalog
    Package(PackageArgs),

    /// List discovered addons with their versions
    List,

    /// Check addons.xml.md5 against addons.xml
    Verify,

    /// Write a starter configuration file
    Init(InitArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let loaded = load_config(&cli.global)?;
    let _guard = init_logging(&resolve_log_config(&cli.global, &loaded))?;

    let repo_config = || resolve_repo_config(&cli.global, &loaded);

    match cli.command {
        Commands::Build(args) => commands::build::run(repo_config()?, args),
        Commands::Catalog => commands::catalog::run(repo_config()?),
        Commands::Package(args) => commands::package::run(repo_config()?, args),
        Commands::List => commands::list::run(repo_config()?),
        Commands::Verify => commands::verify::run(repo_config()?),
        Commands::Init(args) => {
            let source = cli.global.source.clone().unwrap_or_else(|| PathBuf::from("."));
            commands::init::run(source, args)
        }
    }
}
