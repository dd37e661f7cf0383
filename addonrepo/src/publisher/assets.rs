//! Icon and fanart copying.
//!
//! Repository clients show an addon's icon and fanart before downloading its
//! archive, so both are published next to the archive at the same relative
//! path the manifest declares.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};

use super::{PublishError, PublishResult};
use crate::addon::{AddonDescriptor, Manifest};
use crate::config::RepoConfig;

/// One asset that was copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedAsset {
    /// "icon" or "fanart".
    pub kind: &'static str,

    /// Source file.
    pub from: PathBuf,

    /// Destination file.
    pub to: PathBuf,
}

/// Outcome of copying one addon's assets.
#[derive(Debug, Default)]
pub struct AssetCopyResult {
    /// Assets copied.
    pub copied: Vec<CopiedAsset>,

    /// Assets already in place (output directory is the addon directory).
    pub in_place: Vec<PathBuf>,

    /// Assets that could not be copied.
    pub failed: Vec<PublishError>,
}

/// Reject absolute paths and `..` so assets stay inside the addon.
fn safe_relative(relative: &str) -> Option<PathBuf> {
    let path = Path::new(relative);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

/// Copy one asset file, creating the destination directory.
pub fn copy_asset(from: &Path, to: &Path) -> PublishResult<()> {
    if !from.is_file() {
        return Err(PublishError::AssetMissing {
            path: from.to_path_buf(),
        });
    }

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| PublishError::CreateDirectoryFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::copy(from, to).map_err(|e| PublishError::AssetCopyFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy the icon and fanart declared in `manifest` to the addon's output
/// directory.
///
/// Each asset is handled independently; a failure on one never prevents the
/// other from being copied.
pub fn copy_assets(
    addon: &AddonDescriptor,
    manifest: &Manifest,
    config: &RepoConfig,
) -> AssetCopyResult {
    let mut result = AssetCopyResult::default();
    let output_dir = config.addon_output_dir(&addon.name);

    for (kind, declared) in manifest.assets.declared() {
        let Some(relative) = safe_relative(declared) else {
            warn!(
                "Ignoring {} path '{}' of {}: must be relative to the addon",
                kind, declared, addon.name
            );
            result.failed.push(PublishError::AssetMissing {
                path: PathBuf::from(declared),
            });
            continue;
        };

        let from = addon.path.join(&relative);
        let to = output_dir.join(&relative);

        if same_file(&from, &to) {
            result.in_place.push(to);
            continue;
        }

        match copy_asset(&from, &to) {
            Ok(()) => {
                info!("Copied {} {} to {}", kind, from.display(), to.display());
                result.copied.push(CopiedAsset { kind, from, to });
            }
            Err(e) => {
                warn!("Skipping {} of {}: {}", kind, addon.name, e);
                result.failed.push(e);
            }
        }
    }

    result
}
