//! CLI error type.

use addonrepo::config::ConfigError;
use addonrepo::logging::LogError;
use addonrepo::publisher::PublishError;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Logging(#[from] LogError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Verify(String),
}
