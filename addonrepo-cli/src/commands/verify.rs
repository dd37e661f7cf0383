//! Verify command - check addons.xml.md5 against addons.xml.

use console::style;

use addonrepo::config::RepoConfig;
use addonrepo::publisher::{verify_checksum, PublishError};

use crate::error::CliError;

/// Run the verify command.
///
/// A mismatch is an error so scripts can rely on the exit status.
pub fn run(config: RepoConfig) -> Result<(), CliError> {
    let catalog = &config.catalog_path;
    let checksum = config.checksum_path();

    match verify_checksum(catalog, &checksum) {
        Ok(digest) => {
            println!("{} {} {}", style("✓").green(), catalog.display(), digest);
            Ok(())
        }
        Err(PublishError::ChecksumMismatch {
            expected, actual, ..
        }) => Err(CliError::Verify(format!(
            "{} does not match {}: recorded {}, actual {}",
            checksum.display(),
            catalog.display(),
            expected,
            actual
        ))),
        Err(e) => Err(e.into()),
    }
}
