//! The publish pipeline.
//!
//! [`Publisher`] drives the phases in order: pull, discover, catalog and
//! checksum, texture packing, packaging, asset copying, commit and push. Each
//! phase isolates per-addon failures and records them in the
//! [`PublishReport`]; only fatal errors (see [`PublishError::is_fatal`])
//! abort the run.

use std::collections::HashSet;

use tracing::{info, warn};

use super::archive::build_archive;
use super::assets::copy_assets;
use super::catalog::build_catalog;
use super::checksum::write_checksum;
use super::report::{AddonIssue, CatalogSummary, PublishReport, TextureOutcome};
use super::{PublishError, PublishResult};
use crate::addon::{discover, AddonDescriptor};
use crate::config::RepoConfig;
use crate::texture::{pack_addon, TexturePacker, TexturePackerCli};
use crate::vcs::{CommitOutcome, GitCli, SourceControlClient};

/// Which phases a run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Update the working tree before building.
    pub pull: bool,

    /// Regenerate the catalog and its checksum.
    pub catalog: bool,

    /// Pack textures, build archives and copy assets.
    pub package: bool,

    /// Restrict packaging to these addons. Empty means all.
    pub only: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pull: false,
            catalog: true,
            package: true,
            only: Vec::new(),
        }
    }
}

impl RunOptions {
    /// Catalog and checksum only.
    pub fn catalog_only() -> Self {
        Self {
            package: false,
            ..Self::default()
        }
    }

    /// Packaging only, optionally for a subset of addons.
    pub fn package_only(only: Vec<String>) -> Self {
        Self {
            catalog: false,
            only,
            ..Self::default()
        }
    }

    /// Also pull first.
    pub fn with_pull(mut self, pull: bool) -> Self {
        self.pull = pull;
        self
    }

    fn selects(&self, addon: &AddonDescriptor) -> bool {
        self.only.is_empty() || self.only.iter().any(|name| name == &addon.name)
    }
}

/// Repository publisher.
///
/// Holds the configuration and the external collaborators. Nothing is shared
/// between runs.
pub struct Publisher {
    config: RepoConfig,
    source_control: Option<Box<dyn SourceControlClient>>,
    texture_packer: Option<Box<dyn TexturePacker>>,
}

impl Publisher {
    /// A publisher with no collaborators: no pull, commit, push or texture
    /// packing.
    pub fn new(config: RepoConfig) -> Self {
        Self {
            config,
            source_control: None,
            texture_packer: None,
        }
    }

    /// A publisher wired to `git` and, if configured, the texture packer
    /// executable.
    pub fn from_config(config: RepoConfig) -> Self {
        let git = GitCli::from_config(&config.git);
        let packer = config.texture_packer.clone().map(TexturePackerCli::new);

        let mut publisher = Self::new(config).with_source_control(Box::new(git));
        if let Some(packer) = packer {
            publisher = publisher.with_texture_packer(Box::new(packer));
        }
        publisher
    }

    /// Use `client` for pull, commit and push.
    pub fn with_source_control(mut self, client: Box<dyn SourceControlClient>) -> Self {
        self.source_control = Some(client);
        self
    }

    /// Use `packer` to pack media folders.
    pub fn with_texture_packer(mut self, packer: Box<dyn TexturePacker>) -> Self {
        self.texture_packer = Some(packer);
        self
    }

    /// The configuration.
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    fn source_control(&self) -> PublishResult<&dyn SourceControlClient> {
        self.source_control.as_deref().ok_or_else(|| {
            PublishError::InvalidConfig("no source control client configured".to_string())
        })
    }

    /// Discover addons.
    pub fn discover(&self) -> PublishResult<Vec<AddonDescriptor>> {
        discover(&self.config)
    }

    /// Update the working tree from the remote.
    pub fn pull(&self) -> PublishResult<()> {
        self.source_control()?.pull(&self.config.source_root)
    }

    /// Run the selected phases.
    pub fn run(&self, options: &RunOptions) -> PublishResult<PublishReport> {
        let mut report = PublishReport::started();

        if options.pull {
            self.pull()?;
        }

        let addons = self.discover()?;
        report.discovered = addons.iter().map(|a| a.name.clone()).collect();
        info!(
            "Found {} addons in {}",
            addons.len(),
            self.config.source_root.display()
        );

        if options.catalog {
            self.write_catalog(&addons, &mut report);
        }

        if options.package {
            let selected: Vec<AddonDescriptor> =
                addons.into_iter().filter(|a| options.selects(a)).collect();
            for name in &options.only {
                if !selected.iter().any(|a| &a.name == name) {
                    warn!("Addon {} not found in {}", name, self.config.source_root.display());
                }
            }

            let packed = self.pack_textures(&selected, &mut report)?;
            self.package(&selected, &packed, &mut report);
        }

        report.finish();
        Ok(report)
    }

    /// Build, write and checksum the catalog.
    ///
    /// Write failures are recorded in the report, never returned.
    pub fn write_catalog(&self, addons: &[AddonDescriptor], report: &mut PublishReport) {
        let catalog = build_catalog(addons, &self.config);
        let path = self.config.catalog_path.clone();
        let checksum_path = self.config.checksum_path();

        let mut summary = CatalogSummary {
            path: path.clone(),
            checksum_path: checksum_path.clone(),
            written: false,
            checksum: None,
            included: catalog.included.clone(),
            excluded: Vec::new(),
        };

        match catalog.write(&path) {
            Ok(()) => {
                summary.written = true;
                match write_checksum(&path, &checksum_path) {
                    Ok(digest) => summary.checksum = Some(digest),
                    Err(e) => {
                        warn!("Could not write checksum: {}", e);
                        report.persistence_errors.push(e);
                    }
                }
            }
            Err(e) => {
                warn!("Could not write catalog: {}", e);
                report.persistence_errors.push(e);
            }
        }

        summary.excluded = catalog
            .excluded
            .into_iter()
            .map(|(addon, error)| AddonIssue { addon, error })
            .collect();
        report.catalog = Some(summary);
    }

    /// Pack textures for each addon with a media folder.
    ///
    /// Returns the names of addons whose pack succeeded. A missing packer
    /// executable aborts the run; any other failure is recorded for that
    /// addon only.
    pub fn pack_textures(
        &self,
        addons: &[AddonDescriptor],
        report: &mut PublishReport,
    ) -> PublishResult<HashSet<String>> {
        let mut packed = HashSet::new();
        let Some(packer) = self.texture_packer.as_deref() else {
            return Ok(packed);
        };

        for addon in addons {
            match pack_addon(packer, addon, &self.config) {
                Ok(Some(output)) => {
                    packed.insert(addon.name.clone());
                    report.textures.push(TextureOutcome {
                        addon: addon.name.clone(),
                        result: Ok(output),
                    });
                }
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Texture packing failed for {}: {}", addon.name, e);
                    report.textures.push(TextureOutcome {
                        addon: addon.name.clone(),
                        result: Err(e),
                    });
                }
            }
        }

        Ok(packed)
    }

    /// Build archives and copy assets.
    pub fn package(
        &self,
        addons: &[AddonDescriptor],
        packed: &HashSet<String>,
        report: &mut PublishReport,
    ) {
        for addon in addons {
            let manifest = match addon.read_manifest(&self.config) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!("Skipping {}: {}", addon.name, e);
                    report.record(&addon.name, e);
                    continue;
                }
            };

            match manifest.version() {
                Ok(version) => {
                    let textures_packed = packed.contains(&addon.name);
                    match build_archive(addon, version, &self.config, textures_packed) {
                        Ok(archive) => report.archives.push(archive),
                        Err(e) => {
                            warn!("Failed to package {}: {}", addon.name, e);
                            report.record(&addon.name, e);
                        }
                    }
                }
                Err(e) => {
                    warn!("Skipping {}: {}", addon.name, e);
                    report.record(&addon.name, e);
                }
            }

            let assets = copy_assets(addon, &manifest, &self.config);
            report.assets.push((addon.name.clone(), assets));
        }
    }

    /// Commit everything `report` says was written.
    pub fn commit(
        &self,
        report: &mut PublishReport,
        message: &str,
    ) -> PublishResult<CommitOutcome> {
        let paths = report.written_paths();
        let outcome = self
            .source_control()?
            .commit(&self.config.source_root, &paths, message)?;
        if outcome == CommitOutcome::NothingToCommit {
            info!("Nothing to commit");
        }
        report.commit = Some(outcome.clone());
        Ok(outcome)
    }

    /// Push the configured branch to the configured remote.
    pub fn push(&self, report: &mut PublishReport) -> PublishResult<()> {
        let git = &self.config.git;
        self.source_control()?
            .push(&self.config.source_root, &git.remote, &git.branch)?;
        report.pushed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_addon(root: &Path, name: &str, manifest: Option<&str>) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("default.py"), "print('hi')").unwrap();
        if let Some(text) = manifest {
            fs::write(dir.join("addon.xml"), text).unwrap();
        }
    }

    #[test]
    fn test_run_full_without_collaborators() {
        let temp = TempDir::new().unwrap();
        write_addon(temp.path(), "A", Some("<addon id=\"A\" version=\"1.0\"/>"));
        write_addon(temp.path(), "B", None);
        write_addon(temp.path(), "C", Some("<addon id=\"C\"/>"));

        let publisher = Publisher::new(RepoConfig::new(temp.path()));
        let report = publisher.run(&RunOptions::default()).unwrap();

        assert_eq!(report.discovered, vec!["A", "B", "C"]);
        let catalog = report.catalog.as_ref().unwrap();
        assert_eq!(catalog.included, vec!["A", "C"]);
        assert_eq!(catalog.excluded.len(), 1);
        assert!(catalog.written);
        assert!(catalog.checksum.is_some());

        assert_eq!(report.archives.len(), 1);
        assert_eq!(report.archives[0].archive_name, "A-1.0.zip");
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.addon.as_str()).collect();
        assert_eq!(skipped, vec!["B", "C"]);
        assert!(!report.has_failures());
        assert!(report.elapsed().is_some());
    }

    #[test]
    fn test_catalog_only_builds_no_archives() {
        let temp = TempDir::new().unwrap();
        write_addon(temp.path(), "A", Some("<addon version=\"1.0\"/>"));

        let publisher = Publisher::new(RepoConfig::new(temp.path()));
        let report = publisher.run(&RunOptions::catalog_only()).unwrap();

        assert!(report.catalog.is_some());
        assert!(report.archives.is_empty());
        assert!(!temp.path().join("A/A-1.0.zip").exists());
    }

    #[test]
    fn test_package_only_subset() {
        let temp = TempDir::new().unwrap();
        write_addon(temp.path(), "A", Some("<addon version=\"1.0\"/>"));
        write_addon(temp.path(), "B", Some("<addon version=\"2.0\"/>"));

        let publisher = Publisher::new(RepoConfig::new(temp.path()));
        let report = publisher
            .run(&RunOptions::package_only(vec!["B".to_string()]))
            .unwrap();

        assert!(report.catalog.is_none());
        assert!(!temp.path().join("addons.xml").exists());
        assert_eq!(report.archives.len(), 1);
        assert!(temp.path().join("B/B-2.0.zip").exists());
        assert!(!temp.path().join("A/A-1.0.zip").exists());
    }

    #[test]
    fn test_catalog_write_failure_does_not_stop_packaging() {
        let temp = TempDir::new().unwrap();
        write_addon(temp.path(), "A", Some("<addon version=\"1.0\"/>"));
        let config = RepoConfig::new(temp.path().join("src"))
            .with_output_root(temp.path().join("out"))
            .with_catalog_path(temp.path().join("out").join("addons.xml"));
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::rename(temp.path().join("A"), temp.path().join("src/A")).unwrap();
        fs::create_dir_all(temp.path().join("out/addons.xml")).unwrap();

        let report = Publisher::new(config).run(&RunOptions::default()).unwrap();

        assert_eq!(report.persistence_errors.len(), 1);
        let catalog = report.catalog.as_ref().unwrap();
        assert!(!catalog.written);
        assert!(catalog.checksum.is_none());
        assert_eq!(report.archives.len(), 1);
        assert!(report.has_failures());

        // Only what was written is offered for commit.
        let written = report.written_paths();
        assert_eq!(written, vec![temp.path().join("out/A")]);
    }

    #[test]
    fn test_discovery_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let publisher = Publisher::new(RepoConfig::new(temp.path().join("missing")));
        let err = publisher.run(&RunOptions::default()).unwrap_err();
        assert!(matches!(err, PublishError::DiscoveryFailed { .. }));
    }

    #[test]
    fn test_commit_without_client_is_config_error() {
        let temp = TempDir::new().unwrap();
        let publisher = Publisher::new(RepoConfig::new(temp.path()));
        let mut report = PublishReport::default();
        let err = publisher.commit(&mut report, "msg").unwrap_err();
        assert!(matches!(err, PublishError::InvalidConfig(_)));
    }
}
