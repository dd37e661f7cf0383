//! Runtime configuration for a repository build.
//!
//! [`RepoConfig`] is constructed once (from defaults, the config file and CLI
//! arguments) and passed by reference into every phase of the pipeline. There
//! is no process-wide configuration state.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::publisher::{PublishError, PublishResult};

/// Manifest filename inside each addon directory.
pub const DEFAULT_MANIFEST_FILENAME: &str = "addon.xml";

/// Catalog filename written to the source root.
pub const DEFAULT_CATALOG_FILENAME: &str = "addons.xml";

/// Extension appended to the catalog path for the checksum file.
pub const CHECKSUM_EXTENSION: &str = "md5";

/// Archive extension (without the leading dot).
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "zip";

/// Entries whose name starts with this character are never addons and never
/// packaged.
pub const DEFAULT_RESERVED_PREFIX: char = '.';

/// Folders that only hold sources for generated content.
pub const DEFAULT_SOURCE_ONLY_FOLDERS: &[&str] = &["src"];

/// Folder holding skin/addon media that the texture packer consumes.
pub const DEFAULT_MEDIA_FOLDER: &str = "media";

/// Image extensions treated as texture-packer input.
pub const DEFAULT_MEDIA_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tga"];

/// Default remote to push to.
pub const DEFAULT_GIT_REMOTE: &str = "origin";

/// Default branch to push.
pub const DEFAULT_GIT_BRANCH: &str = "master";

/// Default commit message for generated files.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Automatically generated commit";

/// Order in which discovered addons are processed and written to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddonOrder {
    /// Sorted by directory name (deterministic).
    #[default]
    Name,
    /// Whatever order the filesystem lists entries in.
    Listing,
}

impl AddonOrder {
    /// Config file representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddonOrder::Name => "name",
            AddonOrder::Listing => "listing",
        }
    }
}

impl FromStr for AddonOrder {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" | "sorted" => Ok(AddonOrder::Name),
            "listing" | "filesystem" => Ok(AddonOrder::Listing),
            other => Err(PublishError::InvalidConfig(format!(
                "unknown addon order '{}' (expected 'name' or 'listing')",
                other
            ))),
        }
    }
}

impl fmt::Display for AddonOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with image files under the media folder when packaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaImagePolicy {
    /// Always ship media images in the archive.
    Keep,
    /// Never ship media images in the archive.
    Exclude,
    /// Leave media images out only when the texture packer produced a packed
    /// texture file for the addon.
    #[default]
    WhenPacked,
}

impl MediaImagePolicy {
    /// Config file representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaImagePolicy::Keep => "keep",
            MediaImagePolicy::Exclude => "exclude",
            MediaImagePolicy::WhenPacked => "when-packed",
        }
    }

    /// Whether media images are excluded given the addon's texture-pack state.
    pub fn excludes(&self, textures_packed: bool) -> bool {
        match self {
            MediaImagePolicy::Keep => false,
            MediaImagePolicy::Exclude => true,
            MediaImagePolicy::WhenPacked => textures_packed,
        }
    }
}

impl FromStr for MediaImagePolicy {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(MediaImagePolicy::Keep),
            "exclude" => Ok(MediaImagePolicy::Exclude),
            "when-packed" | "when_packed" => Ok(MediaImagePolicy::WhenPacked),
            other => Err(PublishError::InvalidConfig(format!(
                "unknown media policy '{}' (expected 'keep', 'exclude' or 'when-packed')",
                other
            ))),
        }
    }
}

impl fmt::Display for MediaImagePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version control settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitConfig {
    /// Remote name to push to.
    pub remote: String,

    /// Branch name to push.
    pub branch: String,

    /// Value for `GIT_SSH_COMMAND`, e.g. `plink -i key.ppk`.
    pub ssh_command: Option<String>,

    /// Commit message for generated files.
    pub commit_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: DEFAULT_GIT_REMOTE.to_string(),
            branch: DEFAULT_GIT_BRANCH.to_string(),
            ssh_command: None,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}

/// Configuration for one repository build.
#[derive(Debug, Clone)]
pub struct RepoConfig {
    /// Directory containing one subdirectory per addon.
    pub source_root: PathBuf,

    /// Directory receiving `<name>/<name>-<version>.<ext>` and copied assets.
    pub output_root: PathBuf,

    /// Path of the combined catalog file.
    pub catalog_path: PathBuf,

    /// Manifest filename inside each addon.
    pub manifest_filename: String,

    /// Archive extension, without the leading dot.
    pub archive_extension: String,

    /// Reserved first character for hidden entries.
    pub reserved_prefix: char,

    /// Top-level addon folders left out of archives entirely.
    pub source_only_folders: Vec<String>,

    /// Top-level addon folder holding media images.
    pub media_folder: String,

    /// Lowercase image extensions under the media folder.
    pub media_image_extensions: Vec<String>,

    /// Media image handling.
    pub media_policy: MediaImagePolicy,

    /// Additional exclusions, matched against paths relative to the addon root.
    pub exclude_patterns: Vec<glob::Pattern>,

    /// Addon processing order.
    pub order: AddonOrder,

    /// Version control settings.
    pub git: GitConfig,

    /// Texture packer executable. `None` disables texture packing.
    pub texture_packer: Option<PathBuf>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl RepoConfig {
    /// Create a configuration rooted at `source_root`.
    ///
    /// Archives are written next to the sources (output root = source root)
    /// and the catalog lands in the source root, matching the usual layout of
    /// a checked-out addon repository.
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        let source_root = source_root.into();
        Self {
            output_root: source_root.clone(),
            catalog_path: source_root.join(DEFAULT_CATALOG_FILENAME),
            source_root,
            manifest_filename: DEFAULT_MANIFEST_FILENAME.to_string(),
            archive_extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
            reserved_prefix: DEFAULT_RESERVED_PREFIX,
            source_only_folders: DEFAULT_SOURCE_ONLY_FOLDERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            media_folder: DEFAULT_MEDIA_FOLDER.to_string(),
            media_image_extensions: DEFAULT_MEDIA_IMAGE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            media_policy: MediaImagePolicy::default(),
            exclude_patterns: Vec::new(),
            order: AddonOrder::default(),
            git: GitConfig::default(),
            texture_packer: None,
        }
    }

    /// Set the output root.
    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    /// Set the catalog path.
    pub fn with_catalog_path(mut self, catalog_path: impl Into<PathBuf>) -> Self {
        self.catalog_path = catalog_path.into();
        self
    }

    /// Set the archive extension. A leading dot is ignored.
    pub fn with_archive_extension(mut self, extension: &str) -> Self {
        self.archive_extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Set the source-only folders.
    pub fn with_source_only_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_only_folders = folders.into_iter().map(Into::into).collect();
        self
    }

    /// Set the media image policy.
    pub fn with_media_policy(mut self, policy: MediaImagePolicy) -> Self {
        self.media_policy = policy;
        self
    }

    /// Set the addon order.
    pub fn with_order(mut self, order: AddonOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the texture packer executable.
    pub fn with_texture_packer(mut self, executable: impl Into<PathBuf>) -> Self {
        self.texture_packer = Some(executable.into());
        self
    }

    /// Add a glob exclusion pattern.
    pub fn with_exclude_pattern(mut self, pattern: &str) -> PublishResult<Self> {
        let compiled = glob::Pattern::new(pattern).map_err(|e| {
            PublishError::InvalidConfig(format!("invalid exclude pattern '{}': {}", pattern, e))
        })?;
        self.exclude_patterns.push(compiled);
        Ok(self)
    }

    /// Path of the checksum file (`<catalog>.md5`).
    pub fn checksum_path(&self) -> PathBuf {
        let mut path = self.catalog_path.clone().into_os_string();
        path.push(".");
        path.push(CHECKSUM_EXTENSION);
        PathBuf::from(path)
    }

    /// Output directory for one addon.
    pub fn addon_output_dir(&self, addon_name: &str) -> PathBuf {
        self.output_root.join(addon_name)
    }

    /// Whether a file or directory name is hidden.
    pub fn is_reserved(&self, name: &str) -> bool {
        name.starts_with(self.reserved_prefix)
    }

    /// Whether a filename ends in the archive extension.
    ///
    /// The whole extension is matched, so dotted extensions such as
    /// `tar.gz` work. A bare extension with no stem does not count.
    pub fn is_archive_file(&self, name: &str) -> bool {
        let suffix = format!(".{}", self.archive_extension.to_ascii_lowercase());
        name.len() > suffix.len() && name.to_ascii_lowercase().ends_with(&suffix)
    }

    /// Check the configuration for unusable values.
    pub fn validate(&self) -> PublishResult<()> {
        if self.archive_extension.is_empty() {
            return Err(PublishError::InvalidConfig(
                "archive extension must not be empty".to_string(),
            ));
        }
        if self.manifest_filename.is_empty() {
            return Err(PublishError::InvalidConfig(
                "manifest filename must not be empty".to_string(),
            ));
        }
        if self.git.remote.is_empty() || self.git.branch.is_empty() {
            return Err(PublishError::InvalidConfig(
                "git remote and branch must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
