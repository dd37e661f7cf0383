//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use addonrepo::config::{find_config_file, ConfigFile, RepoConfig};
use addonrepo::logging::LogConfig;

use crate::error::CliError;

/// Options accepted by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Directory containing the addons [default: current directory]
    #[arg(long, global = true)]
    pub source: Option<PathBuf>,

    /// Directory receiving archives and assets [default: source directory]
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Config file to use instead of the usual search
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write daily log files to this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

/// Config file contents and where they came from.
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub file: ConfigFile,
    pub path: Option<PathBuf>,
}

/// Load the config file, if any.
///
/// An explicit `--config` must exist; a discovered one must parse.
pub fn load_config(args: &GlobalArgs) -> Result<LoadedConfig, CliError> {
    let lookup_root = args.source.clone().unwrap_or_else(|| PathBuf::from("."));

    if let Some(explicit) = &args.config {
        if !explicit.is_file() {
            return Err(CliError::Config(format!(
                "Config file {} does not exist",
                explicit.display()
            )));
        }
    }

    match find_config_file(args.config.as_deref(), &lookup_root) {
        Some(path) => {
            let file = ConfigFile::load_from(&path)?;
            Ok(LoadedConfig {
                file,
                path: Some(path),
            })
        }
        None => Ok(LoadedConfig::default()),
    }
}

/// Resolve the repository configuration.
///
/// CLI arguments take precedence, then the config file, then defaults.
pub fn resolve_repo_config(
    args: &GlobalArgs,
    loaded: &LoadedConfig,
) -> Result<RepoConfig, CliError> {
    let source = args
        .source
        .clone()
        .or_else(|| loaded.file.repository.source.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = loaded.file.apply_to(RepoConfig::new(source))?;

    if let Some(output) = &args.output {
        config.output_root = output.clone();
    }

    config.validate()?;

    if let Some(path) = &loaded.path {
        debug!("Using config file {}", path.display());
    }
    Ok(config)
}

/// Resolve logging settings. `-v` and `--log-dir` override the file.
pub fn resolve_log_config(args: &GlobalArgs, loaded: &LoadedConfig) -> LogConfig {
    let level = loaded
        .file
        .logging
        .level
        .as_deref()
        .map(LogConfig::parse_level)
        .unwrap_or_else(|| LogConfig::default().level);

    LogConfig {
        level,
        directory: args
            .log_dir
            .clone()
            .or_else(|| loaded.file.logging.directory.clone()),
    }
    .with_verbosity(args.verbose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_overrides_file() {
        let temp = TempDir::new().unwrap();
        let ini = temp.path().join("repo.ini");
        fs::write(
            &ini,
            "[repository]\noutput = from-file\n\n[package]\narchive_extension = zip\n",
        )
        .unwrap();

        let args = GlobalArgs {
            source: Some(temp.path().to_path_buf()),
            output: Some(temp.path().join("from-cli")),
            config: Some(ini),
            ..GlobalArgs::default()
        };
        let loaded = load_config(&args).unwrap();
        let config = resolve_repo_config(&args, &loaded).unwrap();

        assert_eq!(config.source_root, temp.path());
        assert_eq!(config.output_root, temp.path().join("from-cli"));
    }

    #[test]
    fn test_missing_explicit_config() {
        let temp = TempDir::new().unwrap();
        let args = GlobalArgs {
            config: Some(temp.path().join("nope.ini")),
            ..GlobalArgs::default()
        };
        assert!(matches!(load_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn test_local_config_discovered() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".addonrepo.ini"),
            "[logging]\nlevel = warn\n",
        )
        .unwrap();

        let args = GlobalArgs {
            source: Some(temp.path().to_path_buf()),
            ..GlobalArgs::default()
        };
        let loaded = load_config(&args).unwrap();
        assert_eq!(loaded.path, Some(temp.path().join(".addonrepo.ini")));
        assert_eq!(resolve_log_config(&args, &loaded).level, "warn");

        let verbose = GlobalArgs { verbose: 2, ..args };
        assert_eq!(resolve_log_config(&verbose, &loaded).level, "trace");
    }
}
