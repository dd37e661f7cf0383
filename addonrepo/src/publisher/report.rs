//! Run summary.

use std::path::PathBuf;

use chrono::{DateTime, Local};

use super::archive::ArchiveBuildResult;
use super::assets::AssetCopyResult;
use super::PublishError;
use crate::vcs::CommitOutcome;

/// An addon left out of a phase, with the reason.
#[derive(Debug)]
pub struct AddonIssue {
    /// Addon name.
    pub addon: String,

    /// Why it was left out.
    pub error: PublishError,
}

/// Catalog phase outcome.
#[derive(Debug, Default)]
pub struct CatalogSummary {
    /// Catalog file.
    pub path: PathBuf,

    /// Checksum file.
    pub checksum_path: PathBuf,

    /// Whether the catalog file was written.
    pub written: bool,

    /// Digest written, if the checksum was persisted.
    pub checksum: Option<String>,

    /// Addons listed in the catalog, in order.
    pub included: Vec<String>,

    /// Addons left out of the catalog.
    pub excluded: Vec<AddonIssue>,
}

/// Texture packing outcome for one addon.
#[derive(Debug)]
pub struct TextureOutcome {
    /// Addon name.
    pub addon: String,

    /// Packed file, or why packing failed.
    pub result: Result<PathBuf, PublishError>,
}

/// Everything a publish run did.
///
/// Expected exclusions (no manifest, no version, missing asset) go to
/// `skipped`; everything else that went wrong for a single addon goes to
/// `failed`. Neither stops the run.
#[derive(Debug, Default)]
pub struct PublishReport {
    /// When the run started.
    pub started_at: Option<DateTime<Local>>,

    /// When the run finished.
    pub finished_at: Option<DateTime<Local>>,

    /// Addons found under the source root, in processing order.
    pub discovered: Vec<String>,

    /// Catalog phase, if it ran.
    pub catalog: Option<CatalogSummary>,

    /// Output files that could not be written.
    pub persistence_errors: Vec<PublishError>,

    /// Texture packing per addon.
    pub textures: Vec<TextureOutcome>,

    /// Archives built.
    pub archives: Vec<ArchiveBuildResult>,

    /// Addons intentionally not packaged.
    pub skipped: Vec<AddonIssue>,

    /// Addons whose packaging failed.
    pub failed: Vec<AddonIssue>,

    /// Asset copying per addon.
    pub assets: Vec<(String, AssetCopyResult)>,

    /// Commit result, if a commit was requested.
    pub commit: Option<CommitOutcome>,

    /// Whether the result was pushed.
    pub pushed: bool,
}

impl PublishReport {
    /// Start a report stamped with the current time.
    pub fn started() -> Self {
        Self {
            started_at: Some(Local::now()),
            ..Self::default()
        }
    }

    /// Stamp the finish time.
    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    /// Wall-clock duration of the run, once finished.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    /// Record a per-addon packaging error in `skipped` or `failed`.
    pub fn record(&mut self, addon: &str, error: PublishError) {
        let issue = AddonIssue {
            addon: addon.to_string(),
            error,
        };
        if issue.error.is_expected() {
            self.skipped.push(issue);
        } else {
            self.failed.push(issue);
        }
    }

    /// Addons whose texture pack succeeded.
    pub fn packed_addons(&self) -> impl Iterator<Item = &str> {
        self.textures
            .iter()
            .filter(|t| t.result.is_ok())
            .map(|t| t.addon.as_str())
    }

    /// Total assets copied.
    pub fn assets_copied(&self) -> usize {
        self.assets.iter().map(|(_, r)| r.copied.len()).sum()
    }

    /// Assets that were declared but not copied.
    pub fn asset_failures(&self) -> impl Iterator<Item = (&str, &PublishError)> {
        self.assets
            .iter()
            .flat_map(|(addon, r)| r.failed.iter().map(move |e| (addon.as_str(), e)))
    }

    /// Whether anything other than an expected exclusion went wrong.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
            || !self.persistence_errors.is_empty()
            || self.textures.iter().any(|t| t.result.is_err())
            || self.asset_failures().any(|(_, e)| !e.is_expected())
    }

    /// Files and directories this run wrote, for committing.
    pub fn written_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(catalog) = self.catalog.as_ref().filter(|c| c.written) {
            paths.push(catalog.path.clone());
            if catalog.checksum.is_some() {
                paths.push(catalog.checksum_path.clone());
            }
        }

        for archive in &self.archives {
            if let Some(dir) = archive.path.parent() {
                paths.push(dir.to_path_buf());
            }
        }

        for (_, result) in &self.assets {
            paths.extend(result.copied.iter().map(|c| c.to.clone()));
        }

        paths.sort();
        paths.dedup();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::CopiedAsset;

    #[test]
    fn test_record_splits_expected_and_faults() {
        let mut report = PublishReport::default();
        report.record(
            "a",
            PublishError::MissingVersion {
                path: PathBuf::from("a/addon.xml"),
            },
        );
        report.record(
            "b",
            PublishError::ArchiveFailed {
                path: PathBuf::from("b/b-1.zip"),
                reason: "disk full".to_string(),
            },
        );

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].addon, "a");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].addon, "b");
        assert!(report.has_failures());
    }

    #[test]
    fn test_only_expected_is_not_failure() {
        let mut report = PublishReport::default();
        report.record(
            "a",
            PublishError::ManifestMissing {
                path: PathBuf::from("a/addon.xml"),
            },
        );
        assert!(!report.has_failures());
    }

    #[test]
    fn test_written_paths() {
        let report = PublishReport {
            catalog: Some(CatalogSummary {
                path: PathBuf::from("/out/addons.xml"),
                checksum_path: PathBuf::from("/out/addons.xml.md5"),
                written: true,
                checksum: Some("abc".to_string()),
                ..CatalogSummary::default()
            }),
            archives: vec![ArchiveBuildResult {
                addon: "a".to_string(),
                version: "1.0".to_string(),
                archive_name: "a-1.0.zip".to_string(),
                path: PathBuf::from("/out/a/a-1.0.zip"),
                file_count: 1,
                dir_count: 0,
                size: 10,
            }],
            ..PublishReport::default()
        };

        assert_eq!(
            report.written_paths(),
            vec![
                PathBuf::from("/out/a"),
                PathBuf::from("/out/addons.xml"),
                PathBuf::from("/out/addons.xml.md5"),
            ]
        );
    }
    #[test]
    fn test_written_paths_skip_unwritten_catalog() {
        let report = PublishReport {
            catalog: Some(CatalogSummary {
                path: PathBuf::from("/out/addons.xml"),
                checksum_path: PathBuf::from("/out/addons.xml.md5"),
                written: false,
                ..CatalogSummary::default()
            }),
            assets: vec![(
                "a".to_string(),
                AssetCopyResult {
                    copied: vec![CopiedAsset {
                        kind: "icon",
                        from: PathBuf::from("/src/a/icon.png"),
                        to: PathBuf::from("/out/a/icon.png"),
                    }],
                    ..AssetCopyResult::default()
                },
            )],
            ..PublishReport::default()
        };

        assert_eq!(report.written_paths(), vec![PathBuf::from("/out/a/icon.png")]);
    }
}
