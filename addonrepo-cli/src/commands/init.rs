//! Init command - write a starter configuration file.

use std::path::PathBuf;

use clap::Args;

use addonrepo::config::{user_config_path, ConfigFile, LOCAL_CONFIG_FILENAME};

use crate::error::CliError;

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write the per-user config file instead of one in the source directory
    #[arg(long)]
    pub user: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Run the init command.
pub fn run(source: PathBuf, args: InitArgs) -> Result<(), CliError> {
    let path = if args.user {
        user_config_path().ok_or_else(|| {
            CliError::Config("Could not determine the user config directory".to_string())
        })?
    } else {
        source.join(LOCAL_CONFIG_FILENAME)
    };

    if path.exists() && !args.force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        )));
    }

    ConfigFile::starter().save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize the repository build.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_config() {
        let temp = TempDir::new().unwrap();
        let args = InitArgs {
            user: false,
            force: false,
        };
        run(temp.path().to_path_buf(), args).unwrap();

        let path = temp.path().join(LOCAL_CONFIG_FILENAME);
        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, ConfigFile::starter());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_FILENAME), "").unwrap();

        let args = InitArgs {
            user: false,
            force: false,
        };
        assert!(matches!(
            run(temp.path().to_path_buf(), args),
            Err(CliError::Config(_))
        ));
    }
}
