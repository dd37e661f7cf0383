//! Error types for the publisher module.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for publisher operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that can occur during publishing operations.
///
/// Variants fall into three groups:
///
/// - **Expected exclusions** ([`is_expected`](Self::is_expected)): an addon is
///   left out of a phase on purpose, e.g. it has no manifest.
/// - **Faults**: an operation failed unexpectedly for one addon or one output
///   file. The run continues without it.
/// - **Fatal** ([`is_fatal`](Self::is_fatal)): the run cannot continue.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The source root could not be listed.
    #[error("failed to read source directory {}: {source}", path.display())]
    DiscoveryFailed { path: PathBuf, source: io::Error },

    /// The addon has no manifest file.
    #[error("manifest not found: {}", path.display())]
    ManifestMissing { path: PathBuf },

    /// The manifest could not be parsed.
    #[error("invalid manifest {}: {reason}", path.display())]
    ManifestInvalid { path: PathBuf, reason: String },

    /// The manifest root element has no version attribute.
    #[error("manifest {} does not declare a version", path.display())]
    MissingVersion { path: PathBuf },

    /// Failed to create directory.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to read file.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write file.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Archive building failed.
    #[error("archive {} failed: {reason}", path.display())]
    ArchiveFailed { path: PathBuf, reason: String },

    /// A declared icon or fanart file does not exist.
    #[error("asset not found: {}", path.display())]
    AssetMissing { path: PathBuf },

    /// Copying an asset failed.
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    AssetCopyFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Checksum verification failed.
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", file.display())]
    ChecksumMismatch {
        file: PathBuf,
        expected: String,
        actual: String,
    },

    /// An external tool could not be started.
    #[error("'{tool}' command not found: {source}")]
    ToolNotFound { tool: String, source: io::Error },

    /// An external tool ran but reported failure.
    #[error("'{tool}' failed: {stderr}")]
    ToolFailed { tool: String, stderr: String },

    /// Configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PublishError {
    /// Whether this error means "addon intentionally left out" rather than
    /// "operation failed".
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            PublishError::ManifestMissing { .. }
                | PublishError::ManifestInvalid { .. }
                | PublishError::MissingVersion { .. }
                | PublishError::AssetMissing { .. }
        )
    }

    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PublishError::DiscoveryFailed { .. }
                | PublishError::ToolNotFound { .. }
                | PublishError::InvalidConfig(_)
        )
    }
}
