//! List command - show discovered addons and their manifest versions.

use console::style;

use addonrepo::addon::discover;
use addonrepo::config::RepoConfig;

use crate::error::CliError;

/// Run the list command.
pub fn run(config: RepoConfig) -> Result<(), CliError> {
    let addons = discover(&config)?;

    if addons.is_empty() {
        println!("No addons found in {}", config.source_root.display());
        return Ok(());
    }

    let width = addons.iter().map(|a| a.name.len()).max().unwrap_or(0);

    for addon in &addons {
        let status = match addon.read_manifest(&config) {
            Ok(manifest) => match manifest.version() {
                Ok(version) => style(version.to_string()).green(),
                Err(e) => style(e.to_string()).yellow(),
            },
            Err(e) if e.is_expected() => style(e.to_string()).yellow(),
            Err(e) => style(e.to_string()).red(),
        };
        println!("{:width$}  {}", addon.name, status, width = width);
    }

    println!();
    println!("{} addons", addons.len());
    Ok(())
}
