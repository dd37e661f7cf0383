//! Archive building for addon distribution.
//!
//! Each addon is packed into `<output>/<name>/<name>-<version>.zip` with every
//! entry prefixed by the addon name, which is the layout Kodi expects when
//! installing from a zip.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{PublishError, PublishResult};
use crate::addon::{archive_entry_name, archive_filename, AddonDescriptor};
use crate::config::RepoConfig;

/// Result of building an archive.
#[derive(Debug, Clone)]
pub struct ArchiveBuildResult {
    /// Addon name.
    pub addon: String,

    /// Version the archive was built for.
    pub version: String,

    /// Archive filename (e.g. "plugin.video.test-1.0.0.zip").
    pub archive_name: String,

    /// Full path to the archive.
    pub path: PathBuf,

    /// Number of file entries written.
    pub file_count: usize,

    /// Number of directory entries written, including the addon root.
    pub dir_count: usize,

    /// Archive size in bytes.
    pub size: u64,
}

/// Decides which addon entries stay out of the archive.
///
/// Paths are relative to the addon root. Names that are not valid UTF-8 are
/// matched in their lossy form.
#[derive(Debug)]
pub struct PackageRules<'a> {
    config: &'a RepoConfig,
    exclude_media_images: bool,
    nested_output: Option<PathBuf>,
    own_archive: Option<PathBuf>,
}

impl<'a> PackageRules<'a> {
    /// Rules for one addon.
    ///
    /// `archive_path` is the archive being written. When it lies inside the
    /// addon tree it is never packed into itself, and when its directory lies
    /// strictly inside the tree that subtree is excluded so previous builds
    /// are never re-packed.
    pub fn new(
        config: &'a RepoConfig,
        addon_root: &Path,
        archive_path: &Path,
        textures_packed: bool,
    ) -> Self {
        let output_dir = archive_path
            .parent()
            .and_then(|dir| relative_to(addon_root, dir));
        let own_archive = match (&output_dir, archive_path.file_name()) {
            (Some(dir), Some(name)) => Some(dir.join(name)),
            _ => None,
        };

        Self {
            config,
            exclude_media_images: config.media_policy.excludes(textures_packed),
            nested_output: output_dir.filter(|rel| !rel.as_os_str().is_empty()),
            own_archive,
        }
    }

    /// Whether the entry at `relative` is left out.
    pub fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        if self.own_archive.as_deref() == Some(relative) {
            return true;
        }

        let Some(name) = relative.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };

        if self.config.is_reserved(&name) {
            return true;
        }
        if !is_dir && self.config.is_archive_file(&name) {
            return true;
        }

        if let Some(top) = first_component(relative) {
            let top: &str = &top;
            if self.config.source_only_folders.iter().any(|f| f == top) {
                return true;
            }
            if !is_dir
                && self.exclude_media_images
                && top == self.config.media_folder
                && self.is_media_image(&name)
            {
                return true;
            }
        }

        if let Some(output) = &self.nested_output {
            if relative.starts_with(output) {
                return true;
            }
        }

        if !self.config.exclude_patterns.is_empty() {
            let relative_str = slash_path(relative);
            if self
                .config
                .exclude_patterns
                .iter()
                .any(|p| p.matches(&relative_str))
            {
                return true;
            }
        }

        false
    }

    fn is_media_image(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.config
                    .media_image_extensions
                    .iter()
                    .any(|m| m.eq_ignore_ascii_case(ext))
            })
    }
}

fn first_component(path: &Path) -> Option<Cow<'_, str>> {
    path.components().find_map(|c| match c {
        Component::Normal(part) => Some(part.to_string_lossy()),
        _ => None,
    })
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `dir` relative to `addon_root` when inside it. Empty when they are the
/// same directory.
fn relative_to(addon_root: &Path, dir: &Path) -> Option<PathBuf> {
    let root = fs::canonicalize(addon_root).unwrap_or_else(|_| addon_root.to_path_buf());
    let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());

    dir.strip_prefix(&root).ok().map(Path::to_path_buf)
}

/// Build the distributable archive for one addon.
///
/// A partially written archive is removed on failure.
pub fn build_archive(
    addon: &AddonDescriptor,
    version: &str,
    config: &RepoConfig,
    textures_packed: bool,
) -> PublishResult<ArchiveBuildResult> {
    if !addon.path.is_dir() {
        return Err(PublishError::ArchiveFailed {
            path: addon.path.clone(),
            reason: "addon directory does not exist".to_string(),
        });
    }

    let output_dir = config.addon_output_dir(&addon.name);
    fs::create_dir_all(&output_dir).map_err(|e| PublishError::CreateDirectoryFailed {
        path: output_dir.clone(),
        source: e,
    })?;

    let archive_name = archive_filename(&addon.name, version, &config.archive_extension);
    let archive_path = output_dir.join(&archive_name);
    let rules = PackageRules::new(config, &addon.path, &archive_path, textures_packed);

    let (file_count, dir_count) = match write_archive(addon, &archive_path, &rules) {
        Ok(counts) => counts,
        Err(e) => {
            if archive_path.exists() {
                let _ = fs::remove_file(&archive_path);
            }
            return Err(e);
        }
    };

    let size = fs::metadata(&archive_path)
        .map_err(|e| PublishError::ReadFailed {
            path: archive_path.clone(),
            source: e,
        })?
        .len();

    info!(
        "Merged addon {} into {} ({} files)",
        addon.name,
        archive_path.display(),
        file_count
    );

    Ok(ArchiveBuildResult {
        addon: addon.name.clone(),
        version: version.to_string(),
        archive_name,
        path: archive_path,
        file_count,
        dir_count,
        size,
    })
}

/// Write the zip. Returns `(file_count, dir_count)`.
fn write_archive(
    addon: &AddonDescriptor,
    archive_path: &Path,
    rules: &PackageRules<'_>,
) -> PublishResult<(usize, usize)> {
    let archive_err = |reason: String| PublishError::ArchiveFailed {
        path: archive_path.to_path_buf(),
        reason,
    };

    let file = File::create(archive_path).map_err(|e| PublishError::WriteFailed {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let root = addon.path.as_path();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match entry.path().strip_prefix(root) {
            Ok(rel) if rel.as_os_str().is_empty() => true,
            Ok(rel) => !rules.is_excluded(rel, entry.file_type().is_dir()),
            Err(_) => false,
        });

    let mut file_count = 0;
    let mut dir_count = 0;

    for entry in walker {
        let entry = entry.map_err(|e| archive_err(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| archive_err(e.to_string()))?;

        if entry.file_type().is_dir() {
            let name = archive_entry_name(&addon.name, relative, true);
            zip.add_directory(name, options)
                .map_err(|e| archive_err(e.to_string()))?;
            dir_count += 1;
        } else if entry.path().is_file() {
            let name = archive_entry_name(&addon.name, relative, false);
            debug!("Adding {} to {}", entry.path().display(), archive_path.display());

            let mut source = File::open(entry.path()).map_err(|e| PublishError::ReadFailed {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            zip.start_file(name, options)
                .map_err(|e| archive_err(e.to_string()))?;
            io::copy(&mut source, &mut zip).map_err(|e| archive_err(e.to_string()))?;
            file_count += 1;
        }
    }

    zip.finish().map_err(|e| archive_err(e.to_string()))?;

    Ok((file_count, dir_count))
}
