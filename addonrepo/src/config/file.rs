//! INI configuration file.
//!
//! ```ini
//! [repository]
//! source = .
//! output = dist
//! catalog = addons.xml
//! order = name
//!
//! [package]
//! archive_extension = zip
//! source_only_folders = src
//! media_folder = media
//! media_policy = when-packed
//! exclude = *.pyc, tests/*
//!
//! [git]
//! remote = origin
//! branch = master
//! ssh_command = plink -i key.ppk
//! commit_message = Automatically generated commit
//!
//! [texture]
//! packer = /usr/bin/TexturePacker
//!
//! [logging]
//! level = info
//! directory = logs
//! ```
//!
//! Every key is optional. Relative paths in `[repository]` are resolved
//! against the directory containing the config file.

use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::repo::{AddonOrder, MediaImagePolicy, RepoConfig};
use crate::publisher::PublishError;

/// Config filename looked up inside the source root.
pub const LOCAL_CONFIG_FILENAME: &str = ".addonrepo.ini";

/// Config filename inside the user config directory.
pub const USER_CONFIG_FILENAME: &str = "config.ini";

/// Errors loading or saving the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: ini::Error },

    #[error("failed to write config file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// `[repository]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySection {
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub order: Option<String>,
}

/// `[package]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSection {
    pub archive_extension: Option<String>,
    pub source_only_folders: Option<Vec<String>>,
    pub media_folder: Option<String>,
    pub media_policy: Option<String>,
    pub exclude: Vec<String>,
}

/// `[git]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitSection {
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub ssh_command: Option<String>,
    pub commit_message: Option<String>,
}

/// `[texture]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureSection {
    pub packer: Option<PathBuf>,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub directory: Option<PathBuf>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub repository: RepositorySection,
    pub package: PackageSection,
    pub git: GitSection,
    pub texture: TextureSection,
    pub logging: LoggingSection,
}

/// Path of the per-user config file, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("addonrepo").join(USER_CONFIG_FILENAME))
}

/// Locate the config file to use.
///
/// An explicit path always wins. Otherwise `<source>/.addonrepo.ini` is
/// preferred over the per-user config file. Returns `None` when nothing
/// exists.
pub fn find_config_file(explicit: Option<&Path>, source_root: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = source_root.join(LOCAL_CONFIG_FILENAME);
    if local.is_file() {
        return Some(local);
    }

    user_config_path().filter(|p| p.is_file())
}

fn get(ini: &Ini, section: &str, key: &str) -> Option<String> {
    ini.section(Some(section))
        .and_then(|s| s.get(key))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ConfigFile {
    /// Load a config file from disk.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config = Self::from_ini(&ini);
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    fn from_ini(ini: &Ini) -> Self {
        Self {
            repository: RepositorySection {
                source: get(ini, "repository", "source").map(PathBuf::from),
                output: get(ini, "repository", "output").map(PathBuf::from),
                catalog: get(ini, "repository", "catalog").map(PathBuf::from),
                order: get(ini, "repository", "order"),
            },
            package: PackageSection {
                archive_extension: get(ini, "package", "archive_extension"),
                source_only_folders: ini
                    .section(Some("package"))
                    .and_then(|s| s.get("source_only_folders"))
                    .map(split_list),
                media_folder: get(ini, "package", "media_folder"),
                media_policy: get(ini, "package", "media_policy"),
                exclude: get(ini, "package", "exclude")
                    .map(|v| split_list(&v))
                    .unwrap_or_default(),
            },
            git: GitSection {
                remote: get(ini, "git", "remote"),
                branch: get(ini, "git", "branch"),
                ssh_command: get(ini, "git", "ssh_command"),
                commit_message: get(ini, "git", "commit_message"),
            },
            texture: TextureSection {
                packer: get(ini, "texture", "packer").map(PathBuf::from),
            },
            logging: LoggingSection {
                level: get(ini, "logging", "level"),
                directory: get(ini, "logging", "directory").map(PathBuf::from),
            },
        }
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut Option<PathBuf>| {
            if let Some(path) = p {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        };
        resolve(&mut self.repository.source);
        resolve(&mut self.repository.output);
        resolve(&mut self.repository.catalog);
        resolve(&mut self.logging.directory);
    }

    /// Write this config to disk, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        self.to_ini()
            .write_to_file(path)
            .map_err(|e| ConfigError::Write {
                path: path.to_path_buf(),
                source: e,
            })
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        fn set(ini: &mut Ini, section: &str, key: &str, value: Option<String>) {
            if let Some(value) = value {
                ini.with_section(Some(section)).set(key, value);
            }
        }
        let path_str = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());

        set(&mut ini, "repository", "source", path_str(&self.repository.source));
        set(&mut ini, "repository", "output", path_str(&self.repository.output));
        set(&mut ini, "repository", "catalog", path_str(&self.repository.catalog));
        set(&mut ini, "repository", "order", self.repository.order.clone());

        set(
            &mut ini,
            "package",
            "archive_extension",
            self.package.archive_extension.clone(),
        );
        set(
            &mut ini,
            "package",
            "source_only_folders",
            self.package.source_only_folders.as_ref().map(|f| f.join(", ")),
        );
        set(&mut ini, "package", "media_folder", self.package.media_folder.clone());
        set(&mut ini, "package", "media_policy", self.package.media_policy.clone());
        if !self.package.exclude.is_empty() {
            set(
                &mut ini,
                "package",
                "exclude",
                Some(self.package.exclude.join(", ")),
            );
        }

        set(&mut ini, "git", "remote", self.git.remote.clone());
        set(&mut ini, "git", "branch", self.git.branch.clone());
        set(&mut ini, "git", "ssh_command", self.git.ssh_command.clone());
        set(&mut ini, "git", "commit_message", self.git.commit_message.clone());

        set(&mut ini, "texture", "packer", path_str(&self.texture.packer));

        set(&mut ini, "logging", "level", self.logging.level.clone());
        set(&mut ini, "logging", "directory", path_str(&self.logging.directory));

        ini
    }

    /// A starter config with every default written out.
    pub fn starter() -> Self {
        let defaults = RepoConfig::new(".");
        Self {
            repository: RepositorySection {
                source: None,
                output: None,
                catalog: None,
                order: Some(defaults.order.as_str().to_string()),
            },
            package: PackageSection {
                archive_extension: Some(defaults.archive_extension),
                source_only_folders: Some(defaults.source_only_folders),
                media_folder: Some(defaults.media_folder),
                media_policy: Some(defaults.media_policy.as_str().to_string()),
                exclude: Vec::new(),
            },
            git: GitSection {
                remote: Some(defaults.git.remote),
                branch: Some(defaults.git.branch),
                ssh_command: None,
                commit_message: Some(defaults.git.commit_message),
            },
            texture: TextureSection::default(),
            logging: LoggingSection {
                level: Some("info".to_string()),
                directory: None,
            },
        }
    }

    /// Overlay file values onto `config`.
    ///
    /// The source root is not touched here; callers resolve it before
    /// constructing `config` because other defaults derive from it.
    pub fn apply_to(&self, mut config: RepoConfig) -> Result<RepoConfig, ConfigError> {
        if let Some(output) = &self.repository.output {
            config.output_root = output.clone();
        }
        if let Some(catalog) = &self.repository.catalog {
            config.catalog_path = catalog.clone();
        }
        if let Some(order) = &self.repository.order {
            config.order = order.parse().map_err(|e: PublishError| invalid("repository.order", e))?;
        }

        if let Some(ext) = &self.package.archive_extension {
            config = config.with_archive_extension(ext);
        }
        if let Some(folders) = &self.package.source_only_folders {
            config.source_only_folders = folders.clone();
        }
        if let Some(media) = &self.package.media_folder {
            config.media_folder = media.clone();
        }
        if let Some(policy) = &self.package.media_policy {
            config.media_policy = policy
                .parse::<MediaImagePolicy>()
                .map_err(|e| invalid("package.media_policy", e))?;
        }
        for pattern in &self.package.exclude {
            config = config
                .with_exclude_pattern(pattern)
                .map_err(|e| invalid("package.exclude", e))?;
        }

        if let Some(remote) = &self.git.remote {
            config.git.remote = remote.clone();
        }
        if let Some(branch) = &self.git.branch {
            config.git.branch = branch.clone();
        }
        if let Some(ssh) = &self.git.ssh_command {
            config.git.ssh_command = Some(ssh.clone());
        }
        if let Some(message) = &self.git.commit_message {
            config.git.commit_message = message.clone();
        }

        if let Some(packer) = &self.texture.packer {
            config.texture_packer = Some(packer.clone());
        }

        Ok(config)
    }
}

fn invalid(key: &str, err: PublishError) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
[repository]
output = dist
catalog = dist/addons.xml
order = listing

[package]
archive_extension = zip
source_only_folders = src, tools
media_policy = exclude
exclude = *.pyc, tests/*

[git]
remote = upstream
branch = main
ssh_command = ssh -i key

[texture]
packer = /opt/kodi/TexturePacker
";

    #[test]
    fn test_load_sample() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(LOCAL_CONFIG_FILENAME);
        fs::write(&path, SAMPLE).unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.repository.output, Some(temp.path().join("dist")));
        assert_eq!(
            config.repository.catalog,
            Some(temp.path().join("dist/addons.xml"))
        );
        assert_eq!(config.repository.order.as_deref(), Some("listing"));
        assert_eq!(
            config.package.source_only_folders,
            Some(vec!["src".to_string(), "tools".to_string()])
        );
        assert_eq!(config.package.exclude, vec!["*.pyc", "tests/*"]);
        assert_eq!(config.git.remote.as_deref(), Some("upstream"));
        assert_eq!(
            config.texture.packer,
            Some(PathBuf::from("/opt/kodi/TexturePacker"))
        );
    }

    #[test]
    fn test_apply_to() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(LOCAL_CONFIG_FILENAME);
        fs::write(&path, SAMPLE).unwrap();

        let file = ConfigFile::load_from(&path).unwrap();
        let config = file.apply_to(RepoConfig::new(temp.path())).unwrap();

        assert_eq!(config.output_root, temp.path().join("dist"));
        assert_eq!(config.order, AddonOrder::Listing);
        assert_eq!(config.media_policy, MediaImagePolicy::Exclude);
        assert_eq!(config.exclude_patterns.len(), 2);
        assert_eq!(config.git.remote, "upstream");
        assert_eq!(config.git.branch, "main");
        assert_eq!(config.git.ssh_command.as_deref(), Some("ssh -i key"));
        assert_eq!(config.git.commit_message, "Automatically generated commit");
        assert!(config.texture_packer.is_some());
    }

    #[test]
    fn test_apply_invalid_policy() {
        let mut file = ConfigFile::default();
        file.package.media_policy = Some("sometimes".to_string());

        let result = file.apply_to(RepoConfig::new("/repo"));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = ConfigFile::load_from(&temp.path().join("missing.ini"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_save_and_reload_starter() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        ConfigFile::starter().save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();

        assert_eq!(loaded.package.archive_extension.as_deref(), Some("zip"));
        assert_eq!(loaded.package.media_policy.as_deref(), Some("when-packed"));
        assert_eq!(loaded.git.branch.as_deref(), Some("master"));
        assert!(loaded.apply_to(RepoConfig::new("/repo")).is_ok());
    }

    #[test]
    fn test_find_prefers_explicit_then_local() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("custom.ini");

        assert_eq!(
            find_config_file(Some(&explicit), temp.path()),
            Some(explicit.clone())
        );

        let local = temp.path().join(LOCAL_CONFIG_FILENAME);
        fs::write(&local, "").unwrap();
        assert_eq!(find_config_file(None, temp.path()), Some(local));
    }
}
