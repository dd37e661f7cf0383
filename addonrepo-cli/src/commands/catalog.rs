//! Catalog command - regenerate addons.xml and its checksum.

use addonrepo::config::RepoConfig;
use addonrepo::publisher::{Publisher, RunOptions};

use super::output;
use crate::error::CliError;

/// Run the catalog command.
pub fn run(config: RepoConfig) -> Result<(), CliError> {
    let publisher = Publisher::new(config);
    let report = publisher.run(&RunOptions::catalog_only())?;
    output::print_report(&report);
    Ok(())
}
