//! Package command - build archives without touching the catalog.

use clap::Args;

use addonrepo::config::RepoConfig;
use addonrepo::publisher::{Publisher, RunOptions};

use super::output;
use crate::error::CliError;

/// Arguments for the package command.
#[derive(Debug, Args)]
pub struct PackageArgs {
    /// Addons to package [default: all]
    pub addons: Vec<String>,
}

/// Run the package command.
pub fn run(config: RepoConfig, args: PackageArgs) -> Result<(), CliError> {
    let publisher = Publisher::from_config(config);
    let report = publisher.run(&RunOptions::package_only(args.addons))?;
    output::print_report(&report);
    Ok(())
}
