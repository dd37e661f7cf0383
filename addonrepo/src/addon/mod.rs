//! Addon discovery and per-addon metadata.
//!
//! An addon is any immediate subdirectory of the source root whose name does
//! not start with the reserved prefix. Each addon carries a manifest
//! (`addon.xml`) describing at least its version.

mod manifest;
mod naming;

pub use manifest::{Manifest, ManifestAssets};
pub use naming::{archive_entry_name, archive_filename};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{AddonOrder, RepoConfig};
use crate::publisher::{PublishError, PublishResult};

/// A discovered addon subproject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonDescriptor {
    /// Directory name, also used as the archive name prefix.
    pub name: String,

    /// Full path to the addon directory.
    pub path: PathBuf,
}

impl AddonDescriptor {
    /// Create a descriptor.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Path of this addon's manifest.
    pub fn manifest_path(&self, config: &RepoConfig) -> PathBuf {
        self.path.join(&config.manifest_filename)
    }

    /// Read and parse this addon's manifest.
    pub fn read_manifest(&self, config: &RepoConfig) -> PublishResult<Manifest> {
        Manifest::read(&self.manifest_path(config))
    }

    /// Read this addon's manifest as raw text.
    pub fn read_manifest_text(&self, config: &RepoConfig) -> PublishResult<String> {
        manifest::read_text(&self.manifest_path(config))
    }
}

/// Discover addons under the configured source root.
///
/// Entries that are not directories, start with the reserved prefix, have
/// non-UTF-8 names, or cannot be inspected are skipped. Only a failure to
/// list the root itself is an error.
pub fn discover(config: &RepoConfig) -> PublishResult<Vec<AddonDescriptor>> {
    let root = &config.source_root;
    let entries = fs::read_dir(root).map_err(|e| PublishError::DiscoveryFailed {
        path: root.clone(),
        source: e,
    })?;

    let mut addons = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry in {}", root.display());
                continue;
            }
        };

        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            debug!("Skipping non UTF-8 entry {}", path.display());
            continue;
        };

        if config.is_reserved(name) || !is_directory(&path) {
            continue;
        }

        info!("Detected addon {} in {}", name, path.display());
        addons.push(AddonDescriptor::new(name, path.clone()));
    }

    if config.order == AddonOrder::Name {
        addons.sort_by(|a, b| a.name.cmp(&b.name));
    }

    Ok(addons)
}

fn is_directory(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_skips_hidden_and_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("plugin.video.b")).unwrap();
        fs::create_dir(temp.path().join("plugin.video.a")).unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join("addons.xml"), "<addons/>").unwrap();

        let config = RepoConfig::new(temp.path());
        let addons = discover(&config).unwrap();

        let names: Vec<&str> = addons.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["plugin.video.a", "plugin.video.b"]);
        assert_eq!(addons[0].path, temp.path().join("plugin.video.a"));
    }

    #[test]
    fn test_discover_listing_order_keeps_all() {
        let temp = TempDir::new().unwrap();
        for name in ["c", "a", "b"] {
            fs::create_dir(temp.path().join(name)).unwrap();
        }

        let config = RepoConfig::new(temp.path()).with_order(AddonOrder::Listing);
        let mut names: Vec<String> = discover(&config)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_discover_empty_root() {
        let temp = TempDir::new().unwrap();
        let config = RepoConfig::new(temp.path());
        assert!(discover(&config).unwrap().is_empty());
    }

    #[test]
    fn test_discover_missing_root() {
        let config = RepoConfig::new("/nonexistent/addon/root");
        let result = discover(&config);
        assert!(matches!(result, Err(PublishError::DiscoveryFailed { .. })));
        assert!(result.unwrap_err().is_fatal());
    }

    #[test]
    fn test_manifest_path() {
        let config = RepoConfig::new("/repo");
        let addon = AddonDescriptor::new("plugin.test", "/repo/plugin.test");
        assert_eq!(
            addon.manifest_path(&config),
            PathBuf::from("/repo/plugin.test/addon.xml")
        );
    }
}
