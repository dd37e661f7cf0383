//! Configuration for repository builds.
//!
//! - [`RepoConfig`]: the explicit configuration value handed to the pipeline.
//! - [`ConfigFile`]: the optional INI file layered under CLI arguments.

mod file;
mod repo;

pub use file::{
    find_config_file, user_config_path, ConfigError, ConfigFile, GitSection,
    LoggingSection, PackageSection, RepositorySection, TextureSection, LOCAL_CONFIG_FILENAME,
    USER_CONFIG_FILENAME,
};
pub use repo::{
    AddonOrder, GitConfig, MediaImagePolicy, RepoConfig, CHECKSUM_EXTENSION,
    DEFAULT_ARCHIVE_EXTENSION, DEFAULT_CATALOG_FILENAME, DEFAULT_COMMIT_MESSAGE,
    DEFAULT_GIT_BRANCH, DEFAULT_GIT_REMOTE, DEFAULT_MANIFEST_FILENAME, DEFAULT_MEDIA_FOLDER,
    DEFAULT_MEDIA_IMAGE_EXTENSIONS, DEFAULT_RESERVED_PREFIX, DEFAULT_SOURCE_ONLY_FOLDERS,
};
